use crate::domain::article::Article;
use crate::domain::sentiment::SentimentResult;

/// Alert inclusion bar: |compound| >= 0.6, boundary inclusive.
pub const STRONG_SIGNAL_THRESHOLD: f64 = 0.6;

pub const GENERAL_DIGEST_SUBJECT: &str = "Your Daily Market Brief Digest";
pub const PORTFOLIO_ALERT_SUBJECT: &str = "Your Personalized Portfolio News Alert";
pub const TEST_EMAIL_SUBJECT: &str = "Market Brief: Test Notification";

/// A fully-rendered notification payload. Composition is pure formatting;
/// no network or storage I/O happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

pub fn is_strong_signal(compound: f64) -> bool {
    compound >= STRONG_SIGNAL_THRESHOLD || compound <= -STRONG_SIGNAL_THRESHOLD
}

/// Articles that clear the strong-signal bar; unscored articles never do.
pub fn strong_signals(articles: &[Article]) -> Vec<Article> {
    articles
        .iter()
        .filter(|a| a.compound.is_some_and(is_strong_signal))
        .cloned()
        .collect()
}

pub fn compose_general_digest(overall: &SentimentResult, articles: &[Article]) -> EmailContent {
    let mut text = String::new();
    text.push_str("Today's market sentiment: ");
    text.push_str(&overall.label.to_string());
    text.push('\n');
    text.push_str(&overall.reasoning);
    text.push_str("\n\nTop headlines:\n");
    for article in articles {
        text.push_str(&format!(
            "- {} ({}){}\n  {}\n",
            article.title,
            article.source,
            article
                .sentiment
                .map(|s| format!(" [{s}]"))
                .unwrap_or_default(),
            article.url,
        ));
    }

    let mut html = String::new();
    html.push_str(&format!(
        "<h2>Today's market sentiment: {}</h2>\n<p>{}</p>\n<h3>Top headlines</h3>\n<ul>\n",
        overall.label,
        escape_html(&overall.reasoning),
    ));
    for article in articles {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a> &mdash; {}{}</li>\n",
            escape_html(&article.url),
            escape_html(&article.title),
            escape_html(&article.source),
            article
                .sentiment
                .map(|s| format!(" <strong>[{s}]</strong>"))
                .unwrap_or_default(),
        ));
    }
    html.push_str("</ul>\n");

    EmailContent {
        subject: GENERAL_DIGEST_SUBJECT.to_string(),
        text,
        html,
    }
}

/// Formats an already strong-filtered, symbol-tagged article list.
pub fn compose_portfolio_alert(articles: &[Article]) -> EmailContent {
    let mut text = String::new();
    text.push_str("Strong sentiment signals were detected for your portfolio:\n\n");
    for article in articles {
        text.push_str(&format!(
            "[{}] {} ({})\n  {}\n  Sentiment: {}{}\n",
            article.symbol.as_deref().unwrap_or("N/A"),
            article.title,
            article.source,
            article.url,
            article
                .sentiment
                .map(|s| s.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            article
                .compound
                .map(|c| format!(" (compound {c:.2})"))
                .unwrap_or_default(),
        ));
    }

    let mut html = String::new();
    html.push_str(
        "<h2>Portfolio news alert</h2>\n\
         <p>Strong sentiment signals were detected for your portfolio:</p>\n<ul>\n",
    );
    for article in articles {
        html.push_str(&format!(
            "<li><strong>[{}]</strong> <a href=\"{}\">{}</a> &mdash; {}{}</li>\n",
            escape_html(article.symbol.as_deref().unwrap_or("N/A")),
            escape_html(&article.url),
            escape_html(&article.title),
            escape_html(&article.source),
            article
                .compound
                .map(|c| format!(" (compound {c:.2})"))
                .unwrap_or_default(),
        ));
    }
    html.push_str("</ul>\n");

    EmailContent {
        subject: PORTFOLIO_ALERT_SUBJECT.to_string(),
        text,
        html,
    }
}

pub fn compose_test_email() -> EmailContent {
    EmailContent {
        subject: TEST_EMAIL_SUBJECT.to_string(),
        text: "Hello,\n\nThis is a test email from your Market Brief application. \
               If you received this, the notification system is working!\n\n\
               Best regards,\nYour Portfolio Team"
            .to_string(),
        html: "<p>Hello,</p>\n\
               <p>This is a test email from your <strong>Market Brief</strong> application. \
               If you received this, the notification system is working!</p>\n\
               <p>Best regards,<br>Your Portfolio Team</p>\n"
            .to_string(),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sentiment::SentimentLabel;
    use chrono::Utc;

    fn article(id: &str, compound: Option<f64>) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Headline {id}"),
            description: None,
            url: format!("https://example.com/{id}"),
            source: "Test".to_string(),
            published_at: Utc::now(),
            symbol: Some("RELIANCE.NS".to_string()),
            sentiment: compound.map(|c| {
                if c > 0.0 {
                    SentimentLabel::Positive
                } else {
                    SentimentLabel::Negative
                }
            }),
            reasoning: None,
            compound,
        }
    }

    #[test]
    fn strong_signal_boundary_is_inclusive() {
        assert!(is_strong_signal(0.6));
        assert!(is_strong_signal(-0.6));
        assert!(is_strong_signal(0.95));
        assert!(!is_strong_signal(0.59));
        assert!(!is_strong_signal(-0.59));
        assert!(!is_strong_signal(0.0));
    }

    #[test]
    fn strong_signals_keeps_only_qualifying_articles() {
        let articles = vec![
            article("a1", Some(0.6)),
            article("a2", Some(0.59)),
            article("a3", Some(-0.81)),
            article("a4", None),
        ];
        let out = strong_signals(&articles);
        let ids: Vec<&str> = out.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "a3"]);
    }

    #[test]
    fn general_digest_lists_every_article_in_both_bodies() {
        let overall = SentimentResult {
            label: SentimentLabel::Positive,
            reasoning: "Based on an average compound score of 0.21 from 2 articles.".to_string(),
            compound: 0.21,
        };
        let articles = vec![article("a1", Some(0.7)), article("a2", Some(-0.7))];
        let content = compose_general_digest(&overall, &articles);
        assert_eq!(content.subject, GENERAL_DIGEST_SUBJECT);
        for a in &articles {
            assert!(content.text.contains(&a.title));
            assert!(content.html.contains(&a.url));
        }
        assert!(content.html.contains("Positive"));
    }

    #[test]
    fn portfolio_alert_carries_symbol_tags() {
        let content = compose_portfolio_alert(&[article("a1", Some(0.9))]);
        assert_eq!(content.subject, PORTFOLIO_ALERT_SUBJECT);
        assert!(content.text.contains("[RELIANCE.NS]"));
        assert!(content.html.contains("[RELIANCE.NS]"));
    }

    #[test]
    fn html_bodies_escape_article_text() {
        let mut a = article("a1", Some(0.9));
        a.title = "Results <beat> estimates & more".to_string();
        let content = compose_portfolio_alert(&[a]);
        assert!(content.html.contains("Results &lt;beat&gt; estimates &amp; more"));
        assert!(!content.html.contains("<beat>"));
    }
}
