use serde::Serialize;
use url::form_urlencoded;

use crate::domain::models::event::Event;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShareLinks {
    pub public_url: String,
    pub whatsapp_url: String,
    pub email_url: String,
    pub message: String,
}

pub fn public_url(base_url: &str, event: &Event) -> String {
    format!("{}/e/{}", base_url.trim_end_matches('/'), event.short_id)
}

pub fn personal_url(base_url: &str, event: &Event, share_code: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("ref", share_code)
        .finish();
    format!("{}?{}", public_url(base_url, event), query)
}

fn invite_message(event: &Event) -> String {
    let mut message = format!("You're invited to {}!", event.title);
    message.push_str(&format!("\n{} at {}", event.event_date.format("%Y-%m-%d"), event.start_time));
    if !event.location.is_empty() {
        message.push_str(&format!("\n{}", event.location));
    }
    message
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

/// Links the organizer can paste anywhere, plus WhatsApp and mail shortcuts around `link`.
pub fn build_links(event: &Event, link: String) -> ShareLinks {
    let message = invite_message(event);
    let text = format!("{}\n\n{}", message, link);

    ShareLinks {
        whatsapp_url: format!("https://wa.me/?text={}", encode(&text)),
        email_url: format!(
            "mailto:?subject={}&body={}",
            encode(&format!("Invitation: {}", event.title)),
            encode(&text)
        ),
        public_url: link,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dinner() -> Event {
        let mut event = Event::placeholder("tok".into(), None);
        event.short_id = "ab12cd34".into();
        event.title = "Dinner & Wine".into();
        event.event_date = NaiveDate::from_ymd_opt(2030, 2, 3).unwrap();
        event
    }

    #[test]
    fn public_and_personal_links() {
        let event = dinner();
        assert_eq!(public_url("https://konvite.app/", &event), "https://konvite.app/e/ab12cd34");
        assert_eq!(
            personal_url("https://konvite.app", &event, "xyz98765"),
            "https://konvite.app/e/ab12cd34?ref=xyz98765"
        );
    }

    #[test]
    fn whatsapp_and_mail_links_are_encoded() {
        let event = dinner();
        let links = build_links(&event, public_url("https://konvite.app", &event));

        assert!(links.whatsapp_url.starts_with("https://wa.me/?text=You%27re%20invited%20to%20Dinner%20%26%20Wine"));
        assert!(links.whatsapp_url.contains("https%3A%2F%2Fkonvite.app%2Fe%2Fab12cd34"));
        assert!(links.email_url.starts_with("mailto:?subject=Invitation%3A%20Dinner%20%26%20Wine&body="));
        assert!(!links.email_url.contains('+'));
    }
}
