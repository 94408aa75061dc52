//! Shared fixtures for integration tests: the crate's ZIP writer and
//! catalog page builders.
#![allow(dead_code)]

pub use aozora_collector::zip::fixture::ZipBuilder;

/// Encode text as Shift_JIS, the way catalog archives store it
pub fn sjis(text: &str) -> Vec<u8> {
    let (bytes, _, unmappable) = encoding_rs::SHIFT_JIS.encode(text);
    assert!(!unmappable, "{text:?} is not representable in Shift_JIS");
    bytes.into_owned()
}

/// An author index page linking to the given `(href, title)` pairs
pub fn index_page(links: &[(&str, &str)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, title)| format!("<li><a href=\"{href}\">{title}</a>（旧字旧仮名）</li>\n"))
        .collect();
    format!(
        "<html><head><title>作家別作品リスト</title></head><body>\n\
         <a href=\"../index_pages/person_all.html\">作家一覧</a>\n\
         <ol>\n{items}</ol>\n</body></html>"
    )
}

/// A work detail page with an author table and the given download hrefs
pub fn detail_page(author: &str, archive_hrefs: &[&str]) -> String {
    let rows: String = archive_hrefs
        .iter()
        .map(|href| format!("<tr bgcolor=\"white\"><td><a href=\"{href}\">{href}</a></td></tr>\n"))
        .collect();
    format!(
        "<html><body>\n\
         <table summary=\"作家データ\">\n\
         <tr><td class=\"header\">作家名：</td><td><a href=\"../../index_pages/person1.html\">{author}</a></td></tr>\n\
         <tr><td class=\"header\">生年：</td><td>1867-02-09</td></tr>\n\
         </table>\n\
         <table class=\"download\" summary=\"ダウンロードデータ\">\n{rows}</table>\n\
         </body></html>"
    )
}
