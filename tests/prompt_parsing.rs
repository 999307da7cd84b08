#[cfg(test)]
mod tests {
    use inkrelay::ai::models::LengthTier;
    use inkrelay::ai::parse::{count_words, parse_article, parse_model_json};
    use inkrelay::ai::{AiError, PromptSessionCache};
    use std::time::Duration;

    #[test]
    fn strict_parse_handles_clean_json() {
        let value = parse_model_json(r#"{"title":"A","content":"B"}"#).unwrap();
        assert_eq!(value["title"], "A");
        assert_eq!(value["content"], "B");
    }

    #[test]
    fn code_fences_and_embedded_newlines_are_recovered() {
        let raw = "```json\n{\"title\": \"Solar Rooftops\", \"content\": \"Intro line\nSecond line\"}\n```";
        let (title, content) = parse_article(raw).unwrap();
        assert_eq!(title, "Solar Rooftops");
        assert_eq!(content, "Intro line\nSecond line");
    }

    #[test]
    fn control_characters_inside_values_are_dropped() {
        let raw = "{\"title\":\"A\u{7}B\",\"content\":\"C\"}";
        let value = parse_model_json(raw).unwrap();
        assert_eq!(value["title"], "AB");
    }

    #[test]
    fn pretty_printed_output_falls_back_to_extraction() {
        // Newlines between tokens break the strict stage; the pattern stage
        // still finds both fields.
        let raw = "{\n  \"title\": \"T\",\n  \"content\": \"Body text\"\n}";
        let (title, content) = parse_article(raw).unwrap();
        assert_eq!(title, "T");
        assert_eq!(content, "Body text");
    }

    #[test]
    fn extraction_unescapes_literal_newlines_in_content() {
        let raw = "Sure! Here is the article: {\"title\": \"T\", \"content\": \"One\\nTwo\"}";
        let (_, content) = parse_article(raw).unwrap();
        assert_eq!(content, "One\nTwo");
    }

    #[test]
    fn both_stages_failing_is_malformed_output() {
        let err = parse_model_json("I refuse to answer in JSON.").unwrap_err();
        assert!(matches!(err, AiError::MalformedOutput(_)));

        // Parsed JSON without the expected fields is malformed for articles
        let err = parse_article(r#"{"topic":"no article here"}"#).unwrap_err();
        assert!(matches!(err, AiError::MalformedOutput(_)));
    }

    #[test]
    fn word_count_ignores_extra_whitespace() {
        assert_eq!(count_words("  one two\nthree  "), 3);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn length_tiers_map_to_word_ranges() {
        assert_eq!(LengthTier::Short.min_words(), 300);
        assert_eq!(LengthTier::Short.max_words(), Some(1000));
        assert_eq!(LengthTier::MidLength.min_words(), 1000);
        assert_eq!(LengthTier::MidLength.max_words(), Some(2000));
        assert_eq!(LengthTier::Long.min_words(), 2000);
        assert_eq!(LengthTier::Long.max_words(), None);
        assert_eq!(LengthTier::Long.label(), "at least 2000 words");

        assert_eq!("mid-length".parse::<LengthTier>().unwrap(), LengthTier::MidLength);
        assert!("epic".parse::<LengthTier>().is_err());
        assert_eq!(LengthTier::default(), LengthTier::Short);
    }

    #[test]
    fn prompt_sessions_round_trip_until_the_window_closes() {
        let cache = PromptSessionCache::new(Duration::from_millis(10));

        let id = cache.create("write about tide pools");
        assert_eq!(cache.get(&id).unwrap(), "write about tide pools");
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(25));

        // Expired entries are invisible to readers even before the sweeper runs
        assert!(cache.get(&id).is_none());
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.sweep(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_keeps_live_entries() {
        let cache = PromptSessionCache::new(Duration::from_secs(60));
        cache.create("a");
        cache.create("b");
        assert_eq!(cache.sweep(), 0);
        assert_eq!(cache.len(), 2);
    }
}
