//! Literal path rewriting for paths reported by remote media managers.
//!
//! Sonarr and Radarr usually run in their own containers, so the path they
//! report for an imported file is rarely the path this process can open.
//! Rules are plain substring replacements applied in declaration order.

use std::fmt;

/// One `from -> to` replacement rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapping {
    pub from: String,
    pub to: String,
}

/// Ordered, immutable set of path rewrite rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathMappings {
    rules: Vec<PathMapping>,
}

impl PathMappings {
    pub fn new(rules: Vec<PathMapping>) -> Self {
        let rules = rules
            .into_iter()
            .filter(|rule| {
                if rule.from.is_empty() {
                    log::warn!("Ignoring path mapping with an empty source (-> '{}')", rule.to);
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { rules }
    }

    /// Parses `"request_path:cropper_path,request_path2:cropper_path2"`.
    ///
    /// Empty entries and entries that do not split into exactly two parts on
    /// `:` are skipped.
    pub fn parse(spec: &str) -> Self {
        let rules = spec
            .split(',')
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let parts: Vec<&str> = entry.split(':').collect();
                if parts.len() == 2 {
                    Some(PathMapping {
                        from: parts[0].to_string(),
                        to: parts[1].to_string(),
                    })
                } else {
                    log::warn!("Ignoring malformed path mapping '{}'", entry);
                    None
                }
            })
            .collect();
        Self::new(rules)
    }

    /// Applies every rule in order, replacing all occurrences of each.
    pub fn apply(&self, path: &str) -> String {
        self.rules
            .iter()
            .fold(path.to_string(), |acc, rule| acc.replace(&rule.from, &rule.to))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl fmt::Display for PathMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self
            .rules
            .iter()
            .map(|rule| format!("{}:{}", rule.from, rule.to))
            .collect();
        write!(f, "{}", joined.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_malformed_entries() {
        let mappings = PathMappings::parse("/tv:/mnt/tv,,broken,/a:/b:/c,/movies:/mnt/movies");
        assert_eq!(mappings.to_string(), "/tv:/mnt/tv,/movies:/mnt/movies");
        assert!(PathMappings::parse("").is_empty());
    }

    #[test]
    fn test_empty_source_is_dropped() {
        let mappings = PathMappings::parse(":/x,/a:/b");
        assert_eq!(mappings.to_string(), "/a:/b");
        assert_eq!(mappings.apply("/a/file.mkv"), "/b/file.mkv");
    }

    #[test]
    fn test_apply_replaces_every_occurrence() {
        let mappings = PathMappings::parse("data:media");
        assert_eq!(mappings.apply("/data/tv/data/show.mkv"), "/media/tv/media/show.mkv");
    }

    #[test]
    fn test_apply_runs_rules_in_order() {
        // The second rule sees the output of the first one.
        let mappings = PathMappings::parse("/downloads:/staging,/staging:/srv/media");
        assert_eq!(mappings.apply("/downloads/a.mkv"), "/srv/media/a.mkv");

        let reversed = PathMappings::parse("/staging:/srv/media,/downloads:/staging");
        assert_eq!(reversed.apply("/downloads/a.mkv"), "/staging/a.mkv");
    }

    #[test]
    fn test_display_round_trips_rules() {
        let mappings = PathMappings::parse("/tv:/mnt/tv,/movies:/mnt/movies");
        assert_eq!(mappings.to_string(), "/tv:/mnt/tv,/movies:/mnt/movies");
    }
}
