use crate::domain::article::Article;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// The match keyword for a ticker: everything before the first `.`
/// ("RELIANCE" from "RELIANCE.NS").
pub fn root_keyword(symbol: &str) -> &str {
    symbol.split('.').next().unwrap_or(symbol)
}

/// Case-insensitive pattern matching the ticker's root keyword as a whole
/// word or as a substring. The keyword is escaped, so metacharacters in a
/// ticker match literally. Used for both filtering and tag assignment.
pub fn symbol_pattern(symbol: &str) -> Result<Regex> {
    let keyword = regex::escape(root_keyword(symbol));
    RegexBuilder::new(&format!(r"\b{keyword}\b|{keyword}"))
        .case_insensitive(true)
        .build()
        .with_context(|| format!("failed to build match pattern for symbol {symbol:?}"))
}

/// Keeps articles whose title or description mentions some ticker's root
/// keyword, tagging each survivor with the first matching ticker in input
/// order. Empty inputs yield an empty result.
pub fn filter_by_portfolio(articles: &[Article], symbols: &[String]) -> Result<Vec<Article>> {
    if articles.is_empty() || symbols.is_empty() {
        return Ok(Vec::new());
    }

    let patterns: Vec<(String, Regex)> = symbols
        .iter()
        .map(|s| symbol_pattern(s).map(|re| (s.clone(), re)))
        .collect::<Result<_>>()?;

    let mut out = Vec::new();
    for article in articles {
        let text = article.match_text();
        if text.trim().is_empty() {
            continue;
        }
        // First match in input order wins, not the longest match.
        if let Some((symbol, _)) = patterns.iter().find(|(_, re)| re.is_match(&text)) {
            let mut tagged = article.clone();
            tagged.symbol = Some(symbol.clone());
            out.push(tagged);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(id: &str, title: &str, description: Option<&str>) -> Article {
        Article {
            id: id.to_string(),
            title: title.to_string(),
            description: description.map(|s| s.to_string()),
            url: id.to_string(),
            source: "Test".to_string(),
            published_at: Utc::now(),
            symbol: None,
            sentiment: None,
            reasoning: None,
            compound: None,
        }
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn root_keyword_stops_at_first_dot() {
        assert_eq!(root_keyword("RELIANCE.NS"), "RELIANCE");
        assert_eq!(root_keyword("BRK.B.X"), "BRK");
        assert_eq!(root_keyword("TCS"), "TCS");
    }

    #[test]
    fn matches_case_insensitively_in_title_or_description() {
        let articles = vec![
            article("a1", "reliance posts record profit", None),
            article("a2", "Quiet day on the street", Some("TCS wins a new contract")),
            article("a3", "Nothing relevant here", None),
        ];
        let out =
            filter_by_portfolio(&articles, &symbols(&["RELIANCE.NS", "TCS.NS"])).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "a1");
        assert_eq!(out[0].symbol.as_deref(), Some("RELIANCE.NS"));
        assert_eq!(out[1].id, "a2");
        assert_eq!(out[1].symbol.as_deref(), Some("TCS.NS"));
    }

    #[test]
    fn first_symbol_in_input_order_wins_the_tag() {
        let articles = vec![article(
            "a1",
            "Reliance and TCS both rally on earnings",
            None,
        )];
        let out =
            filter_by_portfolio(&articles, &symbols(&["TCS.NS", "RELIANCE.NS"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].symbol.as_deref(), Some("TCS.NS"));
    }

    #[test]
    fn substring_matches_count() {
        // "\b{kw}\b|{kw}" also accepts the keyword embedded in a longer token.
        let articles = vec![article("a1", "HDFCBANK surges after rate decision", None)];
        let out = filter_by_portfolio(&articles, &symbols(&["HDFC.NS"])).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn empty_inputs_yield_empty_output() {
        let articles = vec![article("a1", "Reliance rallies", None)];
        assert!(filter_by_portfolio(&[], &symbols(&["RELIANCE.NS"]))
            .unwrap()
            .is_empty());
        assert!(filter_by_portfolio(&articles, &[]).unwrap().is_empty());
    }

    #[test]
    fn no_article_appears_twice() {
        let articles = vec![article("a1", "Reliance and RELIANCE again", None)];
        let out = filter_by_portfolio(
            &articles,
            &symbols(&["RELIANCE.NS", "RELIANCE.BO"]),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn metacharacters_in_tickers_match_literally() {
        let articles = vec![
            article("a1", "BRK+B climbs in late trading", None),
            article("a2", "BRKXB should not match", None),
        ];
        let out = filter_by_portfolio(&articles, &symbols(&["BRK+B.X"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a1");
    }

    #[test]
    fn only_matching_articles_survive() {
        let articles = vec![
            article("a1", "Sensex ends flat", None),
            article("a2", "Infosys guidance cut", None),
        ];
        let out = filter_by_portfolio(&articles, &symbols(&["INFY.NS", "INFOSYS.NS"])).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a2");
        assert_eq!(out[0].symbol.as_deref(), Some("INFOSYS.NS"));
    }
}
