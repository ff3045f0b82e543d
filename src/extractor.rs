//! Field extraction from LinkedIn Sales Navigator profile markup.
//!
//! Every scrape site is a fallible lookup: a missing node yields `""` for
//! that field and leaves its siblings untouched. The experience and
//! education sub-extractors degrade to empty lists on their own, so a
//! structural surprise in one section never aborts the whole profile.

use scraper::{ElementRef, Html, Selector};

use crate::record::{EducationEntry, ExperienceEntry, FormData, Position, ProfileRecord};

// ── Page selectors ──────────────────────────────────────────────────────────

const PERSON_NAME: &str = r#"[data-anonymize="person-name"]"#;
const JOB_TITLE: &str = r#"[data-anonymize="job-title"]"#;
const COMPANY_NAME: &str = r#"[data-anonymize="company-name"]"#;
const EMAIL: &str = r#"[data-anonymize="email"]"#;
const PERSON_BLURB: &str = r#"[data-anonymize="person-blurb"]"#;

const EXPERIENCE_ENTRY: &str = "._experience-entry_1irc72";
const POSITION_DURATION: &str = ".duration";

const EDUCATION_SCHOOL: &str = r#"h3[data-anonymize="education-name"]"#;
const EDUCATION_LABEL: &str = "h4";
const EDUCATION_DATES: &str =
    "p._bodyText_1e5nen._default_1i6ulk._sizeXSmall_1e5nen._lowEmphasis_1i6ulk > span + span";

const DEGREE_LABEL: &str = "Degree name";
const FIELD_OF_STUDY_LABEL: &str = "Field of study";

/// Whole-profile extraction failure. Per-field and per-entry problems never
/// surface here, only something unexpected at the profile level does.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid selector `{0}`")]
    Selector(&'static str),
}

/// Read the fixed field set out of a parsed profile page.
///
/// The caller's form fields (list/stars/notes) are merged into the record,
/// and `page_url` is captured as the record's `linkedinUrl`. Fields whose
/// nodes are absent come back as `""`; the record shape is always fully
/// populated.
pub fn extract_profile(
    doc: &Html,
    page_url: &str,
    form: &FormData,
) -> Result<ProfileRecord, ExtractError> {
    let root = doc.root_element();

    let mut record = ProfileRecord {
        list: form.list.clone(),
        rating: form.stars.clone(),
        notes: form.notes.clone(),
        linkedin_url: page_url.to_string(),
        ..ProfileRecord::default()
    };

    record.person_name = select_text(root, &parse(PERSON_NAME)?).unwrap_or_default();
    record.job = select_text(root, &parse(JOB_TITLE)?).unwrap_or_default();
    record.company = select_text(root, &parse(COMPANY_NAME)?).unwrap_or_default();
    record.email = select_text(root, &parse(EMAIL)?).unwrap_or_default();
    record.person_blurb = select_text(root, &parse(PERSON_BLURB)?).unwrap_or_default();

    record.experience = extract_experience(doc);
    record.education = extract_education(doc);

    Ok(record)
}

/// Walk the repeated experience containers. Within each entry, job titles
/// and durations are zipped positionally: the positions list has one slot
/// per title element, and a duration list shorter than the titles pads with
/// `""`. Entries with no company and no positions are skipped.
fn extract_experience(doc: &Html) -> Vec<ExperienceEntry> {
    let (Ok(entry_sel), Ok(company_sel), Ok(title_sel), Ok(duration_sel)) = (
        Selector::parse(EXPERIENCE_ENTRY),
        Selector::parse(COMPANY_NAME),
        Selector::parse(JOB_TITLE),
        Selector::parse(POSITION_DURATION),
    ) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for entry in doc.select(&entry_sel) {
        let company = select_text(entry, &company_sel).unwrap_or_default();
        let titles: Vec<String> = entry.select(&title_sel).map(element_text).collect();
        let durations: Vec<String> = entry.select(&duration_sel).map(element_text).collect();

        let mut positions = Vec::new();
        for (i, title) in titles.into_iter().enumerate() {
            let duration = durations.get(i).cloned().unwrap_or_default();
            if !title.is_empty() || !duration.is_empty() {
                positions.push(Position { title, duration });
            }
        }

        if !company.is_empty() || !positions.is_empty() {
            entries.push(ExperienceEntry { company, positions });
        }
    }
    entries
}

/// Walk the education entries keyed off their school-name headings. Each
/// heading's enclosing `li` is scanned for label/value sibling pairs; the
/// two known labels are matched by substring so trailing markup in the
/// label text doesn't matter. All-empty entries are skipped.
fn extract_education(doc: &Html) -> Vec<EducationEntry> {
    let (Ok(school_sel), Ok(label_sel), Ok(dates_sel)) = (
        Selector::parse(EDUCATION_SCHOOL),
        Selector::parse(EDUCATION_LABEL),
        Selector::parse(EDUCATION_DATES),
    ) else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for school in doc.select(&school_sel) {
        let Some(entry) = enclosing_list_item(school) else {
            continue;
        };

        let mut subject = String::new();
        let mut field_of_study = String::new();
        for label in entry.select(&label_sel) {
            let text: String = label.text().collect();
            let Some(value) = next_element_sibling(label) else {
                continue;
            };
            if text.contains(DEGREE_LABEL) {
                subject = element_text(value);
            }
            if text.contains(FIELD_OF_STUDY_LABEL) {
                field_of_study = element_text(value);
            }
        }

        let dates = select_text(entry, &dates_sel).unwrap_or_default();
        let university = element_text(school);

        if !university.is_empty()
            || !subject.is_empty()
            || !field_of_study.is_empty()
            || !dates.is_empty()
        {
            entries.push(EducationEntry {
                university,
                subject,
                field_of_study,
                dates,
            });
        }
    }
    entries
}

// ── Lookup helpers ──────────────────────────────────────────────────────────

fn parse(selector: &'static str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::Selector(selector))
}

/// The basic fallible scrape: first match under `scope`, trimmed text, or
/// `None` when the node is absent.
fn select_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn next_element_sibling<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

fn enclosing_list_item<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == "li")
}
