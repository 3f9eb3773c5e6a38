//! Token filter shared by the repository list and the file tree.
//!
//! A query is split on whitespace into lower-cased tokens. A candidate matches
//! when every token is found, in order, in the lower-cased candidate. Each hit
//! is cut out of the haystack before the next token is looked up, so two
//! tokens can never be satisfied by the same characters.

use crate::navigator::RepoItem;

/// Split a query into lower-cased, non-empty tokens
pub fn parse_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Check a single haystack against a query
pub fn matches(haystack: &str, query: &str) -> bool {
    matches_tokens(&haystack.to_lowercase(), &parse_tokens(query))
}

/// Consuming AND match against pre-parsed tokens. `haystack` must already be lower-cased.
fn matches_tokens(haystack: &str, tokens: &[String]) -> bool {
    let mut remaining = haystack.to_string();
    for token in tokens {
        match remaining.find(token.as_str()) {
            Some(idx) => {
                remaining.replace_range(idx..idx + token.len(), "");
            }
            None => return false,
        }
    }
    true
}

/// Keep the candidates matching every query token, in their original order
pub fn filter<S: AsRef<str>>(candidates: &[S], query: &str) -> Vec<String> {
    let tokens = parse_tokens(query);
    candidates
        .iter()
        .map(AsRef::as_ref)
        .filter(|candidate| tokens.is_empty() || matches_tokens(&candidate.to_lowercase(), &tokens))
        .map(str::to_string)
        .collect()
}

/// Filter repositories on `label + " " + description`
pub fn filter_repos(repos: &[RepoItem], query: &str) -> Vec<RepoItem> {
    let tokens = parse_tokens(query);
    if tokens.is_empty() {
        return repos.to_vec();
    }
    repos
        .iter()
        .filter(|repo| {
            let haystack = format!("{} {}", repo.label, repo.description).to_lowercase();
            matches_tokens(&haystack, &tokens)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn repo(label: &str, description: &str) -> RepoItem {
        RepoItem {
            path: format!("/work/{}", label),
            label: label.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_parse_tokens() {
        assert_eq!(parse_tokens("  Foo   bar\tBAZ "), vec!["foo", "bar", "baz"]);
        assert!(parse_tokens("").is_empty());
        assert!(parse_tokens("   ").is_empty());
    }

    #[test]
    fn test_consuming_semantics() {
        assert!(matches("aa", "a a"));
        assert!(!matches("a", "a a"));
        assert!(matches("src/a.ts", "a ts"));
        assert!(!matches("README.md", "a ts"));
    }

    #[test]
    fn test_overlapping_tokens_cannot_share_characters() {
        // "ab" is consumed first, leaving "c" for the second token
        assert!(!matches("abc", "ab b"));
        assert!(matches("abcb", "ab b"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches("src/Main.RS", "main rs"));
        assert!(matches("src/main.rs", "MAIN"));
    }

    #[test]
    fn test_token_order_matters_for_consumption() {
        // "abab": "aba" consumes the first three chars, "b" remains
        assert!(matches("abab", "aba b"));
        // "ba" then "aba": after removing "ba" from "abab" -> "ab", "aba" fails
        assert!(!matches("abab", "ba aba"));
    }

    #[test]
    fn test_filter_files() {
        let files = vec!["src/a.ts", "src/b.ts", "README.md"];
        assert_eq!(filter(&files, "a ts"), vec!["src/a.ts"]);
        assert_eq!(filter(&files, ""), vec!["src/a.ts", "src/b.ts", "README.md"]);
        assert_eq!(filter(&files, "   "), vec!["src/a.ts", "src/b.ts", "README.md"]);
        assert!(filter(&files, "nothing").is_empty());
    }

    #[test]
    fn test_filter_repos_searches_label_and_description() {
        let repos = vec![repo("api", "backend"), repo("web", "frontend"), repo("tools", "")];
        let found = filter_repos(&repos, "front");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "web");

        let found = filter_repos(&repos, "api back");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, "api");

        assert_eq!(filter_repos(&repos, "").len(), 3);
    }

    #[test]
    fn test_filter_repos_separator_is_a_single_space() {
        let repos = vec![repo("api", "backend")];
        assert_eq!(filter_repos(&repos, "api backend").len(), 1);
        // The joined haystack is "api backend", so "i b" spans the separator
        assert_eq!(filter_repos(&repos, "i b").len(), 1);
    }

    proptest! {
        #[test]
        fn prop_filter_is_order_preserving_subsequence(
            candidates in prop::collection::vec("[a-c/]{0,6}", 0..20),
            query in "[a-c ]{0,6}",
        ) {
            let result = filter(&candidates, &query);
            let mut pos = 0;
            for item in &result {
                let found = candidates[pos..].iter().position(|c| c == item);
                prop_assert!(found.is_some());
                pos += found.unwrap() + 1;
            }
        }

        #[test]
        fn prop_more_tokens_only_restrict(
            candidates in prop::collection::vec("[a-c/]{0,6}", 0..20),
            q1 in "[a-c]{0,3}",
            q2 in "[a-c]{0,3}",
        ) {
            let wide = filter(&candidates, &q1);
            let narrow = filter(&candidates, &format!("{} {}", q1, q2));
            for item in &narrow {
                prop_assert!(wide.contains(item));
            }
        }

        #[test]
        fn prop_blank_query_is_identity(
            candidates in prop::collection::vec("[a-z/. ]{0,8}", 0..20),
            blank in "[ \t]{0,4}",
        ) {
            prop_assert_eq!(filter(&candidates, &blank), candidates.clone());
        }
    }
}
