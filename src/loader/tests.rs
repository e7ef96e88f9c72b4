use crate::stats::testing::RecordingStats;
use crate::{BaseLoader, Document, Error, ItemLoader, MemoryStats, Options, Rules, SelectorKind};
use std::sync::Arc;

loader_type!(QuotesItemLoader);
loader_type!(ProductLoader);

const QUOTES_PAGE: &str = r#"
<html><body>
  <div class="quote" itemscope>
    <span class="text" itemprop="text">“The world as we have created it is a process of our thinking.”</span>
    <span>by <small class="author" itemprop="author">Albert Einstein</small></span>
    <div class="tags"><a class="tag" href="/tag/change/">change</a><a class="tag" href="/tag/thinking/">thinking</a></div>
  </div>
  <div class="quote" itemscope>
    <span class="text" itemprop="text">“It is our choices that show what we truly are.”</span>
    <span>by <small class="author" itemprop="author">J.K. Rowling</small></span>
    <div class="tags"><a class="tag" href="/tag/choices/">choices</a></div>
  </div>
</body></html>"#;

fn recording_loader<'d>(doc: &'d Document) -> (ItemLoader<'d>, Arc<RecordingStats>) {
    let stats = Arc::new(RecordingStats::default());
    let loader = ItemLoader::<BaseLoader>::new().with_scope(doc.root()).with_stats(stats.clone());
    (loader, stats)
}

#[test]
fn title_falls_back_to_second_rule() {
    let doc = Document::parse("<html><body><h2>Hello</h2></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    let values = loader.get_selector_values(Some("title"), SelectorKind::Css, ["h1::text", "h2::text"]).unwrap();

    assert_eq!(values, ["Hello"]);
    assert_eq!(stats.labels(), ["parser/ItemLoader/title/css/1/missing", "parser/ItemLoader/title/css/2"]);
}

#[test]
fn shadowed_rules_are_still_reported() {
    let doc = Document::parse("<html><body><h1>Main</h1><h2>Sub</h2></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    let values = loader.get_selector_values(Some("title"), SelectorKind::Css, ["h1::text", "h2::text", "h3::text"]).unwrap();

    assert_eq!(values, ["Main", "Sub"]);
    assert_eq!(
        stats.labels(),
        ["parser/ItemLoader/title/css/1", "parser/ItemLoader/title/css/2", "parser/ItemLoader/title/css/3/missing"]
    );
}

#[test]
fn positions_continue_across_calls() {
    let doc = Document::parse("<html><body><h1>A</h1><h2>B</h2></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    loader.add_css("title", ["h1::text", "h3::text"]).unwrap();
    loader.add_css("title", "h2::text").unwrap();

    assert_eq!(
        stats.labels(),
        [
            "parser/ItemLoader/title/css/1",
            "parser/ItemLoader/title/css/2/missing",
            "parser/ItemLoader/title/css/3",
        ]
    );
    assert_eq!(loader.get_output_value("title"), Some(&["A".to_string(), "B".to_string()][..]));
}

#[test]
fn kinds_and_fields_count_independently() {
    let doc = Document::parse("<html><body><h1>A</h1><p>text</p></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    loader.add_css("title", "h1::text").unwrap();
    loader.add_xpath("title", ["//h2/text()", "//h1/text()"]).unwrap();
    loader.add_css("body", "p::text").unwrap();
    loader.add_css("title", "h1::text").unwrap();

    assert_eq!(
        stats.labels(),
        [
            "parser/ItemLoader/title/css/1",
            "parser/ItemLoader/title/xpath/1/missing",
            "parser/ItemLoader/title/xpath/2",
            "parser/ItemLoader/body/css/1",
            "parser/ItemLoader/title/css/2",
        ]
    );
}

#[test]
fn non_empty_falsy_values_are_not_missing() {
    let doc = Document::parse(r#"<html><body><input value=""><b>0</b></body></html>"#);
    let (mut loader, stats) = recording_loader(&doc);

    let values = loader.get_selector_values(Some("flags"), SelectorKind::Css, ["input::attr(value)", "b::text"]).unwrap();

    assert_eq!(values, ["", "0"]);
    assert_eq!(stats.labels(), ["parser/ItemLoader/flags/css/1", "parser/ItemLoader/flags/css/2"]);
}

#[test]
fn get_queries_are_never_reported() {
    let doc = Document::parse("<html><body><h1>A</h1></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    assert_eq!(loader.get_css(["h1::text", "h2::text"]).unwrap(), ["A"]);
    assert_eq!(loader.get_xpath("//h1/text()").unwrap(), ["A"]);
    assert!(loader.get_selector_values(Some(""), SelectorKind::Css, "h1::text").unwrap() == ["A"]);

    assert!(stats.labels().is_empty());
    assert!(loader.load_item().is_empty());
}

#[test]
fn unreported_queries_do_not_shift_field_positions() {
    let doc = Document::parse("<html><body><h1>A</h1></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    loader.get_css("h1::text").unwrap();
    loader.add_css("title", "h1::text").unwrap();

    assert_eq!(stats.labels(), ["parser/ItemLoader/title/css/1"]);
}

#[test]
fn no_sink_still_extracts() {
    let doc = Document::parse("<html><body><h2>Hello</h2><h2>World</h2></body></html>");
    let mut loader = ItemLoader::<BaseLoader>::new().with_scope(doc.root());

    let values = loader.get_selector_values(Some("title"), SelectorKind::Css, ["h1::text", "h2::text"]).unwrap();
    assert_eq!(values, ["Hello", "World"]);
}

#[test]
fn empty_rule_list_reports_nothing() {
    let doc = Document::parse("<html><body><h2>Hello</h2></body></html>");
    let (mut loader, stats) = recording_loader(&doc);

    let values = loader.get_selector_values(Some("title"), SelectorKind::Css, Vec::<&str>::new()).unwrap();

    assert!(values.is_empty());
    assert!(stats.labels().is_empty());
    assert_eq!(loader.positions().peek("title", SelectorKind::Css), 1);
}

#[test]
fn missing_scope_is_a_configuration_error() {
    let stats = Arc::new(RecordingStats::default());
    let mut loader = ItemLoader::<QuotesItemLoader>::new().with_stats(stats.clone());

    let err = loader.add_css("quote", ["span::text"]).unwrap_err();

    assert!(matches!(err, Error::MissingSelector { loader: "QuotesItemLoader" }));
    assert!(err.to_string().contains("QuotesItemLoader has no selector bound"));
    assert!(stats.labels().is_empty());
}

#[test]
fn sink_failure_propagates() {
    let doc = Document::parse("<html><body><h1>A</h1></body></html>");
    let stats = Arc::new(RecordingStats::failing());
    let mut loader = ItemLoader::<BaseLoader>::new().with_scope(doc.root()).with_stats(stats);

    let err = loader.add_css("title", "h1::text").unwrap_err();
    assert!(matches!(err, Error::Sink { .. }));
    assert!(loader.get_output_value("title").is_none());
}

#[test]
fn start_position_is_configurable() {
    let doc = Document::parse("<html><body><h1>A</h1></body></html>");
    let stats = Arc::new(RecordingStats::default());
    let options = Options { start_position: 0 };
    let mut loader = ItemLoader::<ProductLoader>::with_options(&options).with_scope(doc.root()).with_stats(stats.clone());

    loader.add_css("name", ["h1::text", "h2::text"]).unwrap();

    assert_eq!(stats.labels(), ["parser/ProductLoader/name/css/0", "parser/ProductLoader/name/css/1/missing"]);
}

#[test]
fn replace_and_literal_values() {
    let doc = Document::parse("<html><body><h1>A</h1><h2>B</h2></body></html>");
    let (mut loader, _stats) = recording_loader(&doc);

    loader.add_css("title", "h1::text").unwrap();
    loader.replace_xpath("title", "//h2/text()").unwrap();
    loader.add_value("source", ["fixture"]);
    loader.replace_value("source", ["page", "cache"]);
    loader.replace_css("gone", "h3::text").unwrap();

    let item = loader.load_item();
    assert_eq!(item.get("title"), Some(&["B".to_string()][..]));
    assert_eq!(item.get("source"), Some(&["page".to_string(), "cache".to_string()][..]));
    assert!(!item.contains("gone"));
    assert_eq!(item.fields().map(|(name, _)| name).collect::<Vec<_>>(), ["title", "source"]);
}

#[test]
fn verbose_trace_carries_outcomes() {
    let doc = Document::parse("<html><body><h2>Hello</h2></body></html>");
    let (mut loader, _stats) = recording_loader(&doc);

    let eval = loader
        .get_selector_values_verbose(Some("title"), SelectorKind::Css, Rules::from(["h1::text", "h2::text"]).named("heading"))
        .unwrap();

    assert_eq!(eval.values, ["Hello"]);
    assert_eq!(eval.outcomes.len(), 2);
    assert!(eval.outcomes[0].is_missing());
    assert_eq!(eval.outcomes[1].expression, "h2::text");
    assert_eq!(
        eval.outcomes[0].label.as_ref().map(ToString::to_string).as_deref(),
        Some("parser/ItemLoader/title/css/1/heading/missing")
    );
}

// --- Quotes scenarios ---------------------------------------------------------

fn crawl_quotes(stats: &Arc<MemoryStats>, mut fill: impl FnMut(&mut ItemLoader<'_, QuotesItemLoader>)) -> usize {
    let doc = Document::parse(QUOTES_PAGE);
    let blocks = doc.root().css("div.quote").unwrap();
    for block in &blocks {
        let mut loader = ItemLoader::<QuotesItemLoader>::new().with_scope(*block).with_stats(stats.clone());
        fill(&mut loader);
        loader.load_item();
    }
    blocks.len()
}

#[test]
fn quotes_simple_all_rules_match() {
    let stats = Arc::new(MemoryStats::new());
    let blocks = crawl_quotes(&stats, |loader| {
        loader.add_css("quote", r#".quote > span[itemprop="text"]::text"#).unwrap();
        loader.add_css("author", ".author::text").unwrap();
    });

    assert_eq!(blocks, 2);
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["parser/QuotesItemLoader/quote/css/1"], 2);
    assert_eq!(snapshot["parser/QuotesItemLoader/author/css/1"], 2);
}

#[test]
fn quotes_dead_fallback_is_flagged_missing() {
    let stats = Arc::new(MemoryStats::new());
    crawl_quotes(&stats, |loader| {
        loader
            .add_css("quote", [".this-quote-does-not-exist span::text", r#".quote > span[itemprop="text"]::text"#])
            .unwrap();
        loader.add_css("author", ".author::text").unwrap();
    });

    assert_eq!(stats.get_value("parser/QuotesItemLoader/quote/css/1/missing"), Some(2));
    assert_eq!(stats.get_value("parser/QuotesItemLoader/quote/css/2"), Some(2));
    assert_eq!(stats.get_value("parser/QuotesItemLoader/author/css/1"), Some(2));
    assert_eq!(stats.dump().missing().count(), 1);
}

#[test]
fn quotes_named_rules() {
    let stats = Arc::new(MemoryStats::new());
    crawl_quotes(&stats, |loader| {
        let quote_rules = [".this-quote-does-not-exist span::text", r#".quote > span[itemprop="text"]::text"#];
        loader.add_css("quote", Rules::from(quote_rules).named("Quotes inside the box")).unwrap();
        loader.add_css("author", Rules::from(".author::text").named("basic author class")).unwrap();
        loader.add_css("tags", Rules::from(".tag::text").named("underneath the author text")).unwrap();
    });

    let expected = [
        ("parser/QuotesItemLoader/author/css/1/basic author class", 2),
        ("parser/QuotesItemLoader/quote/css/1/Quotes inside the box/missing", 2),
        ("parser/QuotesItemLoader/quote/css/2/Quotes inside the box", 2),
        ("parser/QuotesItemLoader/tags/css/1/underneath the author text", 2),
    ];
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.len(), expected.len());
    for (label, count) in expected {
        assert_eq!(snapshot.get(label), Some(&count), "{label}");
    }
}

#[test]
fn quotes_item_contents() {
    let doc = Document::parse(QUOTES_PAGE);
    let block = doc.root().css("div.quote").unwrap()[0];
    let mut loader = ItemLoader::<QuotesItemLoader>::new().with_scope(block);

    loader.add_css("author", ".author::text").unwrap();
    loader.add_xpath("tags", ".//a[@class='tag']/text()").unwrap();
    loader.add_xpath("links", ".//a/@href").unwrap();

    let item = loader.load_item();
    assert_eq!(item.get("author"), Some(&["Albert Einstein".to_string()][..]));
    assert_eq!(item.get("tags").map(<[String]>::len), Some(2));
    assert_eq!(item.get("links").and_then(|links| links.first()).map(String::as_str), Some("/tag/change/"));
}
