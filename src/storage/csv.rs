// src/storage/csv.rs

// Matrixify blog-post import format.

use crate::extractors::article::ArticleRecord;
use url::Url;

pub const DEFAULT_CSV_FILENAME: &str = "blog-migration.csv";
const MERGE: &str = "MERGE";

pub const MATRIXIFY_HEADERS: [&str; 20] = [
    "ID",
    "Handle",
    "Command",
    "Title",
    "Author",
    "Body HTML",
    "Summary HTML",
    "Tags",
    "Tags Command",
    "Created At",
    "Updated At",
    "Published",
    "Published At",
    "Image Src",
    "Image Width",
    "Image Height",
    "Image Alt Text",
    "Blog: ID",
    "Blog: Handle",
    "Blog: Commentable",
];

/// Quotes values containing separators, quotes or line breaks; doubles inner quotes.
pub fn escape_csv_value(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Last path segment of a post URL: `https://blog.example.com/2024/01/my-post/` -> `my-post`.
pub fn url_to_handle(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path()
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .map(str::to_string)
        })
        .unwrap_or_default()
}

fn csv_row(record: &ArticleRecord) -> String {
    let tags = record.tags.join(", ");
    let published = if record.html.is_empty() { "false" } else { "true" };
    let handle = url_to_handle(&record.url);

    let fields: [&str; 20] = [
        "",
        &handle,
        MERGE,
        &record.title,
        &record.author,
        &record.html,
        &record.summary,
        &tags,
        MERGE,
        &record.published_at,
        "",
        published,
        &record.published_at,
        &record.image_src,
        "",
        "",
        &record.image_alt,
        "",
        "",
        "",
    ];
    fields.iter().map(|f| escape_csv_value(f)).collect::<Vec<_>>().join(",")
}

/// Header line plus one row per article, newline-separated.
pub fn generate_csv(records: &[ArticleRecord]) -> String {
    std::iter::once(MATRIXIFY_HEADERS.join(","))
        .chain(records.iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping() {
        assert_eq!(escape_csv_value("plain"), "plain");
        assert_eq!(escape_csv_value("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_value("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_value("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_csv_value(""), "");
    }

    #[test]
    fn handles_from_urls() {
        assert_eq!(url_to_handle("https://blog.example.com/2024/01/my-post/"), "my-post");
        assert_eq!(url_to_handle("https://blog.example.com/my-post"), "my-post");
        assert_eq!(url_to_handle("https://blog.example.com/"), "");
        assert_eq!(url_to_handle("not a url"), "");
    }

    #[test]
    fn rows_follow_header_layout() {
        let mut record = ArticleRecord::failed("https://blog.example.com/ten-bags/", "x");
        record.error = None;
        record.title = "Ten Bags, Ranked".into();
        record.tags = vec!["Bags".into(), "Icons".into()];
        record.html = "<section class=\"blog__rich-text\">\n</section>".into();
        record.published_at = "2023-04-05".into();

        let csv = generate_csv(&[record]);
        let mut lines = csv.splitn(2, '\n');
        assert_eq!(lines.next().unwrap().split(',').count(), MATRIXIFY_HEADERS.len());
        let row = lines.next().unwrap();
        assert!(row.starts_with(",ten-bags,MERGE,\"Ten Bags, Ranked\",,"));
        assert!(row.contains(",\"Bags, Icons\",MERGE,2023-04-05,,true,2023-04-05,"));
        assert!(row.contains("\"<section class=\"\"blog__rich-text\"\">\n</section>\""));
    }

    #[test]
    fn unpublished_without_html() {
        let record = ArticleRecord::failed("https://blog.example.com/a/", "boom");
        let csv = generate_csv(&[record]);
        assert!(csv.lines().nth(1).unwrap().contains(",false,"));
        assert_eq!(generate_csv(&[]), MATRIXIFY_HEADERS.join(","));
    }
}
