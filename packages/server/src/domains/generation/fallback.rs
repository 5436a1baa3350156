//! Deterministic copy used when the model fails or returns nothing usable.

use super::models::{GenerationPayload, TargetType};
use super::prompt::is_generic_caption;

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn sentence(text: &str) -> String {
    let text = text.trim().trim_end_matches([',', ';', ':']);
    let mut chars = text.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => return String::new(),
    };
    if capitalized.ends_with(['.', '!', '?']) {
        capitalized
    } else {
        format!("{}.", capitalized)
    }
}

/// Title from the request, else built from service and location.
pub fn fallback_title(target: TargetType, payload: &GenerationPayload) -> String {
    if let Some(title) = clean(payload.title.as_deref()) {
        return title.to_string();
    }
    let service = clean(payload.service.as_deref());
    let location = clean(payload.location.as_deref());
    match (service, location) {
        (Some(s), Some(l)) => format!("{} in {}", s, l),
        (Some(s), None) => format!("{} Project", s),
        (None, Some(l)) => format!("Recent Project in {}", l),
        (None, None) => match target {
            TargetType::BlogPost => "A Look at a Recent Project".to_string(),
            TargetType::JobListing => "Recent Project".to_string(),
        },
    }
}

/// A short templated paragraph from title, service, location and lead caption.
pub fn fallback_body(
    target: TargetType,
    payload: &GenerationPayload,
    lead_caption: Option<&str>,
) -> String {
    let service = clean(payload.service.as_deref()).map(|s| s.to_lowercase());
    let location = clean(payload.location.as_deref());

    let mut opening = match &service {
        Some(s) => format!("We recently finished a {} project", s),
        None => "We recently finished this project".to_string(),
    };
    if let Some(l) = location {
        opening.push_str(&format!(" in {}", l));
    }

    let mut sentences = vec![sentence(&opening)];

    if let Some(caption) = lead_caption.filter(|c| !is_generic_caption(c)) {
        sentences.push(sentence(caption));
    }
    if let Some(notes) = clean(payload.notes.as_deref()) {
        sentences.push(sentence(notes));
    }

    sentences.push(match target {
        TargetType::BlogPost => {
            "The photos show the work from start to finish. Reach out if you are planning a similar project.".to_string()
        }
        TargetType::JobListing => "Contact us to talk about a similar project.".to_string(),
    });

    sentences.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(service: Option<&str>, location: Option<&str>) -> GenerationPayload {
        GenerationPayload {
            service: service.map(String::from),
            location: location.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_fallback_title() {
        let mut p = payload(Some("Deck Building"), Some("Edina"));
        assert_eq!(fallback_title(TargetType::BlogPost, &p), "Deck Building in Edina");

        p.title = Some(" Cedar Deck ".into());
        assert_eq!(fallback_title(TargetType::BlogPost, &p), "Cedar Deck");

        assert_eq!(
            fallback_title(TargetType::JobListing, &payload(None, None)),
            "Recent Project"
        );
        assert_eq!(
            fallback_title(TargetType::BlogPost, &payload(Some("Siding"), None)),
            "Siding Project"
        );
    }

    #[test]
    fn test_fallback_body_is_deterministic() {
        let p = payload(Some("Deck Building"), Some("Edina"));
        let a = fallback_body(TargetType::JobListing, &p, Some("new composite boards and railing"));
        let b = fallback_body(TargetType::JobListing, &p, Some("new composite boards and railing"));
        assert_eq!(a, b);
        assert_eq!(
            a,
            "We recently finished a deck building project in Edina. New composite boards and railing. Contact us to talk about a similar project."
        );
    }

    #[test]
    fn test_fallback_body_skips_generic_caption() {
        let body = fallback_body(TargetType::BlogPost, &payload(None, None), Some("IMG_4410"));
        assert!(body.starts_with("We recently finished this project."));
        assert!(!body.contains("IMG_4410"));
    }
}
