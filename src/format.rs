// src/format.rs
//
// Projection of extracted wiki fields onto the stable reply schema, and
// rendering of the final markdown reply.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed, ordered mapping from raw Infobox keys to the output schema.
/// Projection is best effort: absent keys are silently omitted, keys not
/// listed here are never shown.
pub const FIELD_PROJECTION: &[(&str, &str)] = &[
    ("name", "name"),
    ("slot", "slot"),
    ("rarity", "rarity"),
    ("type", "type"),
    ("impact", "impact"),
    ("range", "range"),
    ("recoil", "recoil"),
    ("stability", "stability"),
    ("magazine", "magazine size"),
    ("reload", "reload speed"),
    ("zoom", "zoom"),
    ("rate", "rate of fire"),
    ("aim", "aim assist"),
    ("equipspeed", "equip speed"),
];

/// Keys rendered in the title/description lines rather than the stat table.
const HEADER_KEYS: &[&str] = &["name", "rarity", "type", "slot", "url"];

static RE_BRACKET_MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\[|\]\]").unwrap());

/// Ordered field map for one resolved item. Always carries `name` and `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRecord {
    fields: Vec<(String, String)>,
}

impl ItemRecord {
    /// Fallback record when no structured data could be extracted.
    pub fn minimal(name: &str, url: &str) -> Self {
        let mut rec = Self::default();
        rec.set("name", name);
        rec.set("url", url);
        rec
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => self.fields.push((key.to_string(), value.to_string())),
        }
    }

    fn insert_front(&mut self, key: &str, value: &str) {
        self.fields.insert(0, (key.to_string(), value.to_string()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Project raw Infobox fields onto the output schema. `name` falls back to
/// the original query string when extraction produced none; `url` is always
/// carried.
pub fn project(query: &str, url: &str, raw: &HashMap<String, String>) -> ItemRecord {
    let mut rec = ItemRecord::default();
    for &(src, out) in FIELD_PROJECTION {
        if let Some(v) = raw.get(src) {
            let v = v.trim();
            if !v.is_empty() {
                rec.set(out, v);
            }
        }
    }
    if rec.get("name").is_none() {
        rec.insert_front("name", query);
    }
    rec.set("url", url);
    rec
}

/// Render the markdown reply: `[name](url)` title (URL parentheses escaped,
/// since the renderer treats them as link terminators), an optional
/// rarity/type clause with `(slot)` suffix, and a stat table of the
/// remaining projected fields. Stray `[[`/`]]` markers are stripped.
pub fn render(record: &ItemRecord) -> String {
    let name = record.get("name").unwrap_or("");
    let url = record
        .get("url")
        .unwrap_or("")
        .replace('(', "\\(")
        .replace(')', "\\)");
    let mut msg = format!("[{name}]({url})");

    let rarity = record.get("rarity").unwrap_or("");
    let kind = record.get("type").unwrap_or("");
    if !(rarity.is_empty() && kind.is_empty()) {
        msg.push_str(&format!(" - {rarity} {kind}"));
    }
    if let Some(slot) = record.get("slot") {
        msg.push_str(&format!(" ({slot})"));
    }

    let stats: Vec<(&str, &str)> = record
        .iter()
        .filter(|(k, _)| !HEADER_KEYS.contains(k))
        .collect();
    if !stats.is_empty() {
        msg.push_str("\n\n     Stat     |  Value  \n--------------|---------\n");
        for (k, v) in stats {
            msg.push_str(&format!("{:<13} | {:<9}\n", capitalize(k), v));
        }
    }

    RE_BRACKET_MARKERS.replace_all(&msg, "").into_owned()
}

/// Fixed attribution footer: bot disclosure, source link, author.
pub fn append_signature(msg: &str, author: &str, source_link: &str) -> String {
    format!("{msg}\n\n---\n^(I am a bot | [source]({source_link}) | by /u/{author})")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn projection_renames_and_preserves_table_order() {
        let fields = raw(&[
            ("rate", "22"),
            ("impact", "58"),
            ("name", "Thorn"),
            ("manufacturer", "Omolon"),
        ]);
        let rec = project("thorn", "http://x/Thorn", &fields);

        let keys: Vec<&str> = rec.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "impact", "rate of fire", "url"]);
        assert_eq!(rec.get("rate of fire"), Some("22"));
        // Keys outside the projection table are never shown.
        assert_eq!(rec.get("manufacturer"), None);
    }

    #[test]
    fn projection_falls_back_to_query_name() {
        let rec = project("Ice Breaker", "http://x/Ice_Breaker", &raw(&[("impact", "40")]));
        assert_eq!(rec.get("name"), Some("Ice Breaker"));
        assert_eq!(rec.get("url"), Some("http://x/Ice_Breaker"));
    }

    #[test]
    fn blank_values_are_omitted() {
        let rec = project("x", "http://x", &raw(&[("impact", "  "), ("range", "10")]));
        assert_eq!(rec.get("impact"), None);
        assert_eq!(rec.get("range"), Some("10"));
    }

    #[test]
    fn render_full_record() {
        let mut rec = ItemRecord::default();
        rec.set("name", "Thorn");
        rec.set("rarity", "Exotic");
        rec.set("type", "Hand Cannon");
        rec.set("slot", "Primary");
        rec.set("impact", "58");
        rec.set("url", "http://x/Thorn");

        let msg = render(&rec);
        assert!(msg.starts_with("[Thorn](http://x/Thorn)"));
        assert!(msg.contains("Exotic Hand Cannon (Primary)"));
        assert!(msg.contains("Stat     |  Value"));
        assert!(msg.contains(&format!("{:<13} | {:<9}", "Impact", "58")));
    }

    #[test]
    fn render_escapes_url_parentheses() {
        let rec = ItemRecord::minimal("Thorn", "http://x/Thorn_(1)");
        let msg = render(&rec);
        assert!(msg.contains("(http://x/Thorn_\\(1\\))"));
    }

    #[test]
    fn minimal_record_renders_title_only() {
        let msg = render(&ItemRecord::minimal("Thorn", "http://x/Thorn"));
        assert_eq!(msg, "[Thorn](http://x/Thorn)");
    }

    #[test]
    fn clause_omitted_when_rarity_and_type_blank() {
        let mut rec = ItemRecord::minimal("Thorn", "http://x/Thorn");
        rec.set("impact", "58");
        let msg = render(&rec);
        assert!(!msg.contains(" - "));
        assert!(msg.contains("Impact"));
    }

    #[test]
    fn surviving_bracket_markers_are_stripped() {
        let msg = render(&ItemRecord::minimal("[[Thorn]]", "http://x/Thorn"));
        assert_eq!(msg, "[Thorn](http://x/Thorn)");
    }

    #[test]
    fn signature_carries_author_and_source() {
        let out = append_signature("body", "somebody", "https://example.com/repo");
        assert!(out.starts_with("body\n\n---\n"));
        assert!(out.contains("/u/somebody"));
        assert!(out.contains("[source](https://example.com/repo)"));
    }
}
