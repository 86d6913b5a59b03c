//! Key classifiers for the viewer's external-link affordance.

/// A key recognised as belonging to an external post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Permalink {
    pub author: String,
    pub post_id: String,
    pub url: String,
}

/// Decides whether an object key can be decomposed into `{author, post}`.
pub trait PermalinkClassifier {
    fn classify(&self, key: &str) -> Option<Permalink>;
}

/// Accepts keys of exactly three non-empty `/`-separated segments,
/// `{author}/{post}/{file}`, and renders the first two into `template`.
#[derive(Clone, Debug)]
pub struct ThreeSegmentClassifier {
    template: String,
}

impl ThreeSegmentClassifier {
    /// `template` may contain `{author}` and `{post}` placeholders.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl PermalinkClassifier for ThreeSegmentClassifier {
    fn classify(&self, key: &str) -> Option<Permalink> {
        let segments: Vec<&str> = key.split('/').collect();
        let [author, post_id, file] = segments.as_slice() else {
            return None;
        };
        if author.is_empty() || post_id.is_empty() || file.is_empty() {
            return None;
        }

        let url = self
            .template
            .replace("{author}", author)
            .replace("{post}", post_id);
        Some(Permalink {
            author: author.to_string(),
            post_id: post_id.to_string(),
            url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ThreeSegmentClassifier {
        ThreeSegmentClassifier::new("https://x.com/{author}/status/{post}")
    }

    #[test]
    fn test_three_segments_decompose() {
        let link = classifier().classify("nasa/178812/photo.jpg").unwrap();

        assert_eq!(link.author, "nasa");
        assert_eq!(link.post_id, "178812");
        assert_eq!(link.url, "https://x.com/nasa/status/178812");
    }

    #[test]
    fn test_other_shapes_are_suppressed() {
        let c = classifier();
        for key in [
            "photo.jpg",
            "nasa/photo.jpg",
            "nasa/1/2/photo.jpg",
            "/1/photo.jpg",
            "nasa//photo.jpg",
            "nasa/1/",
            "",
        ] {
            assert!(c.classify(key).is_none(), "key {:?}", key);
        }
    }
}
