//! SCOPE tag derivation

/// Tags longer than this many characters qualify.
const MIN_TAG_CHARS: usize = 4;

/// At most this many tags per response.
const MAX_TAGS: usize = 5;

/// Derive scope tags from result contents: whitespace tokens, lowercased,
/// longer than four characters, the first five DISTINCT tokens in
/// first-seen order. A sequence plus a membership check (not a set), so
/// the output is reproducible run to run.
pub fn scope_tags<'a>(contents: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for content in contents {
        for token in content.split_whitespace() {
            let token = token.to_lowercase();
            if token.chars().count() <= MIN_TAG_CHARS {
                continue;
            }
            if tags.contains(&token) {
                continue;
            }
            tags.push(token);
            if tags.len() == MAX_TAGS {
                return tags;
            }
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seen_order_preserved() {
        let tags = scope_tags(["quantum computing advances require patience"]);
        assert_eq!(
            tags,
            vec!["quantum", "computing", "advances", "require", "patience"]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let tags = scope_tags(["stored stored memory graphs memory temporal episodes"]);
        assert_eq!(tags, vec!["stored", "memory", "graphs", "temporal", "episodes"]);
    }

    #[test]
    fn test_short_tokens_skipped() {
        let tags = scope_tags(["the big graph was here today"]);
        assert_eq!(tags, vec!["graph", "today"]);
    }

    #[test]
    fn test_spans_multiple_contents() {
        let tags = scope_tags(["first snippet", "second snippet", "third piece"]);
        assert_eq!(tags, vec!["first", "snippet", "second", "third", "piece"]);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let input = ["paris remains france's capital today", "weather stayed sunny"];
        assert_eq!(scope_tags(input), scope_tags(input));
    }
}
