#![allow(dead_code)]

use tracing_subscriber::{fmt, EnvFilter};

pub const NEKO: &str = "吾輩は猫である。名前はまだない。どこで生れたか頓と見当がつかぬ。何でも薄暗いじめじめした所でニャーニャー泣いていた事だけは記憶している。";

pub const DIARY: &str = "今日は\n朝から\nとても\nいい天気なので\n散歩に\n行ったよ";

// Helper to initialize tracing subscriber
pub fn setup_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Asserts that `chunks` occur in `text` in order and together cover it
/// without gaps, allowing consecutive chunks to overlap.
pub fn assert_covers(text: &str, chunks: &[String]) {
    let mut search_from = 0;
    let mut covered_to = 0;
    for chunk in chunks {
        let offset = text[search_from..]
            .find(chunk.as_str())
            .unwrap_or_else(|| panic!("chunk {:?} not found after byte {}", chunk, search_from));
        let start = search_from + offset;
        assert!(start <= covered_to, "gap before chunk {:?}", chunk);
        covered_to = covered_to.max(start + chunk.len());
        search_from = start + chunk.chars().next().map_or(1, char::len_utf8);
    }
    assert_eq!(covered_to, text.len(), "text not fully covered");
}
