use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::time::Instant;

use crate::{
    models::{FieldId, GeneratedRecord},
    workbench::{CopyAcks, FormState, Workbench},
};

const LOADING_REFRESH_SECS: u64 = 1;

pub fn page(workbench: &Workbench, now: Instant) -> String {
    let acks = workbench.acks();
    let loading = workbench.is_loading();

    let refresh = if loading {
        Some(LOADING_REFRESH_SECS)
    } else {
        acks.next_expiry(now).map(|left| left.as_secs_f64().ceil() as u64)
    };

    let body = match workbench.state() {
        FormState::Idle => empty_state(),
        FormState::Loading { subject } => loading_state(subject),
        FormState::Success { record, generated_at } => {
            record_view(record, &generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(), acks, now)
        }
        FormState::ErrorDisplayed { message } => error_dialog(message) + &empty_state(),
    };

    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if let Some(secs) = refresh {
        html.push_str(&format!("<meta http-equiv=\"refresh\" content=\"{}\">\n", secs.max(1)));
    }
    html.push_str("<title>STL Listing Generator</title>\n");
    html.push_str("<link rel=\"stylesheet\" href=\"/assets/style.css\">\n");
    html.push_str("<script src=\"/assets/app.js\" defer></script>\n</head>\n<body>\n<main>\n");
    html.push_str("<header><h1>🪄 STL Listing Generator</h1>");
    html.push_str("<p>SEO-optimised listing content for your STL models</p></header>\n");
    html.push_str(&form(workbench.last_subject(), loading));
    html.push_str(&body);
    html.push_str("</main>\n</body>\n</html>\n");
    html
}

fn form(subject: &str, loading: bool) -> String {
    let disabled = if loading { " disabled" } else { "" };
    let button = if loading {
        "<span class=\"spinner\"></span>Generating..."
    } else {
        "🪄 Generate"
    };
    format!(
        r#"<form class="card generate" method="post" action="/">
<label for="subject">Figure or model name</label>
<div class="row">
<input id="subject" name="subject" type="text" value="{}" placeholder="e.g. gothic warhammer figure, medieval dragon, elf warrior..." required{disabled}>
<button type="submit"{disabled}>{button}</button>
</div>
</form>
"#,
        attr(subject)
    )
}

fn empty_state() -> String {
    "<section class=\"card empty\"><p>Enter the name of your figure and generate listing content optimised for Cults3D</p></section>\n".to_string()
}

fn loading_state(subject: &str) -> String {
    format!(
        "<section class=\"card loading\"><span class=\"spinner\"></span><p>Generating listing for “{}”...</p></section>\n",
        text(subject)
    )
}

fn error_dialog(message: &str) -> String {
    format!(
        r#"<dialog class="alert" open>
<p>Failed to generate content. Please try again.</p>
<pre>{}</pre>
<form method="dialog"><button>OK</button></form>
</dialog>
"#,
        text(message)
    )
}

fn copy_button(record: &GeneratedRecord, field: FieldId, acks: &CopyAcks, now: Instant) -> String {
    let (class, icon) = if acks.is_active(field, now) { ("copy copied", "✓") } else { ("copy", "⧉") };
    format!(
        r#"<form class="{class}" method="post" action="/copy/{field}"><button type="submit" title="Copy" data-copy="{}">{icon}</button></form>"#,
        attr(record.field_text(field))
    )
}

fn record_view(record: &GeneratedRecord, generated_at: &str, acks: &CopyAcks, now: Instant) -> String {
    let copy = |field| copy_button(record, field, acks, now);
    let mut html = String::new();

    html.push_str(&format!(
        "<div class=\"toolbar\"><small>Generated {}</small><a class=\"export\" href=\"/export\" download>⬇ Export JSON</a></div>\n",
        text(generated_at)
    ));

    html.push_str(&format!(
        "<section class=\"card\"><div class=\"head\"><h3>Title</h3>{}</div><p class=\"title\">{}</p></section>\n",
        copy(FieldId::Title),
        text(&record.title)
    ));

    html.push_str(&format!(
        "<section class=\"card\"><div class=\"head\"><h3>Description (Markdown)</h3>{}</div><pre class=\"description\">{}</pre></section>\n",
        copy(FieldId::Description),
        text(&record.description)
    ));

    let chips: String = record
        .tag_list()
        .into_iter()
        .map(|tag| format!("<span class=\"tag\">{}</span>", text(tag)))
        .collect();
    html.push_str(&format!(
        "<section class=\"card\"><div class=\"head\"><h3>Tags</h3>{}</div><div class=\"tags\">{chips}</div></section>\n",
        copy(FieldId::Tags)
    ));

    html.push_str(&format!(
        "<section class=\"card\"><div class=\"head\"><h3>SEO Image Names</h3></div><div class=\"names\"><div class=\"name\"><span>Base name:</span><code class=\"base\">{}</code>{}</div>",
        text(&record.base_name),
        copy(FieldId::BaseName)
    ));
    for (key, value) in record.image_names.iter() {
        html.push_str(&format!(
            "<div class=\"name\"><span>{}:</span><code>{}</code>{}</div>",
            key.label(),
            text(value),
            copy(FieldId::Image(key))
        ));
    }
    html.push_str("</div></section>\n");

    html.push_str(&format!(
        "<section class=\"card tip\"><div class=\"head\"><h3>💡 Sales Tip</h3>{}</div><p>{}</p></section>\n",
        copy(FieldId::SalesTip),
        text(&record.sales_tip)
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generator::GenerateError, models::sample_record};
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn idle_page_shows_empty_state() {
        let html = page(&Workbench::default(), Instant::now());
        assert!(html.contains("class=\"card empty\""));
        assert!(!html.contains("http-equiv=\"refresh\""));
        assert!(!html.contains(" disabled"));
    }

    #[test]
    fn loading_page_disables_form_and_refreshes() {
        let mut wb = Workbench::default();
        wb.submit("<b>elf</b>").unwrap();
        let html = page(&wb, Instant::now());
        assert!(html.contains("content=\"1\""));
        assert!(html.contains("required disabled"));
        assert!(html.contains("Generating..."));
        assert!(html.contains("&lt;b&gt;elf&lt;/b&gt;"));
        assert!(!html.contains("class=\"card empty\""));
    }

    #[test]
    fn success_page_renders_every_field_escaped() {
        let mut wb = Workbench::default();
        wb.submit("dragon").unwrap();
        let record = GeneratedRecord { title: "Dragon <Mini> & Co".into(), ..sample_record() };
        wb.complete(Ok(record), Utc::now());
        let html = page(&wb, Instant::now());

        assert!(html.contains("Dragon &lt;Mini&gt; &amp; Co"));
        assert!(html.contains("<span class=\"tag\">tabletop</span>"));
        assert_eq!(html.matches("class=\"tag\"").count(), 10);
        for label in ["Main", "Front", "Side", "Back", "Animated", "Detail", "Render"] {
            assert!(html.contains(&format!("<span>{label}:</span>")), "{label}");
        }
        assert!(html.contains("action=\"/copy/image-render\""));
        assert!(html.contains("action=\"/copy/salesTip\""));
        assert!(html.contains("href=\"/export\""));
        assert!(!html.contains("class=\"card empty\""));
    }

    #[test]
    fn copied_field_is_marked_until_it_expires() {
        let mut wb = Workbench::default();
        wb.submit("dragon").unwrap();
        wb.complete(Ok(sample_record()), Utc::now());
        let now = Instant::now();
        wb.copy(FieldId::Title, now).unwrap();

        let html = page(&wb, now);
        assert_eq!(html.matches("copy copied").count(), 1);
        assert!(html.contains("http-equiv=\"refresh\" content=\"2\""));

        let html = page(&wb, now + Duration::from_secs(2));
        assert_eq!(html.matches("copy copied").count(), 0);
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn refresh_follows_the_earliest_expiring_copy() {
        let mut wb = Workbench::default();
        wb.submit("dragon").unwrap();
        wb.complete(Ok(sample_record()), Utc::now());
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(1500);
        wb.copy(FieldId::Title, t0).unwrap();
        wb.copy(FieldId::Tags, t1).unwrap();

        let html = page(&wb, t1);
        assert_eq!(html.matches("copy copied").count(), 2);
        assert!(html.contains("http-equiv=\"refresh\" content=\"1\""));

        let html = page(&wb, t0 + Duration::from_secs(2));
        assert_eq!(html.matches("copy copied").count(), 1);
        assert!(html.contains("http-equiv=\"refresh\" content=\"2\""));
    }

    #[test]
    fn error_page_opens_dialog_without_record() {
        let mut wb = Workbench::default();
        wb.submit("dragon").unwrap();
        wb.complete(Err(GenerateError::Parse("bad json".into())), Utc::now());
        let html = page(&wb, Instant::now());
        assert!(html.contains("<dialog class=\"alert\" open>"));
        assert!(html.contains("bad json"));
        assert!(!html.contains("href=\"/export\""));
    }
}
