//! The viewer's JS preset table must agree with the engine presets
//! bitwise. The engine side is the source of truth; this test fails
//! on any drift in either direction.

use beads_search::{list_presets, Weights};
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;

const TOLERANCE: f64 = 1e-9;

fn js_asset_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join("hybrid_scorer.js")
}

fn load_js_presets() -> HashMap<String, Weights> {
    let content = std::fs::read_to_string(js_asset_path()).expect("read hybrid_scorer.js");

    let block_re = Regex::new(r"(?s)const\s+HYBRID_PRESETS\s*=\s*\{(.*?)\n\};").unwrap();
    let block = block_re
        .captures(&content)
        .expect("locate HYBRID_PRESETS block")
        .get(1)
        .unwrap()
        .as_str();

    let entry_re = Regex::new(r#"(?m)^\s*(?:'([^']+)'|"([^"]+)"|([A-Za-z0-9_-]+))\s*:\s*\{([^}]*)\}"#)
        .unwrap();
    let field_re = Regex::new(r"([a-zA-Z_]+)\s*:\s*([0-9.]+)").unwrap();

    let mut presets = HashMap::new();
    for entry in entry_re.captures_iter(block) {
        let name = entry
            .get(1)
            .or_else(|| entry.get(2))
            .or_else(|| entry.get(3))
            .unwrap()
            .as_str()
            .to_string();
        let body = entry.get(4).unwrap().as_str();

        let mut fields: HashMap<String, f64> = HashMap::new();
        for field in field_re.captures_iter(body) {
            let key = field.get(1).unwrap().as_str().to_string();
            let value: f64 = field.get(2).unwrap().as_str().parse().unwrap();
            fields.insert(key, value);
        }
        for required in ["text", "pagerank", "status", "impact", "priority", "recency"] {
            assert!(
                fields.contains_key(required),
                "preset {name:?} missing key {required:?} in JS"
            );
        }
        presets.insert(
            name,
            Weights {
                text_relevance: fields["text"],
                pagerank: fields["pagerank"],
                status: fields["status"],
                impact: fields["impact"],
                priority: fields["priority"],
                recency: fields["recency"],
            },
        );
    }
    assert!(!presets.is_empty(), "no presets parsed from JS block");
    presets
}

fn assert_close(preset: &str, field: &str, engine: f64, js: f64) {
    assert!(
        (engine - js).abs() <= TOLERANCE,
        "preset {preset:?} {field} mismatch: engine={engine} js={js}"
    );
}

#[test]
fn presets_match_javascript_table() {
    let js_presets = load_js_presets();
    let engine_presets = list_presets();

    assert_eq!(
        js_presets.len(),
        engine_presets.len(),
        "preset count mismatch: js={} engine={}",
        js_presets.len(),
        engine_presets.len()
    );

    for preset in engine_presets {
        let name = preset.as_str();
        let engine = preset.weights();
        let js = *js_presets
            .get(name)
            .unwrap_or_else(|| panic!("missing preset {name:?} in JS"));

        assert_close(name, "text", engine.text_relevance, js.text_relevance);
        assert_close(name, "pagerank", engine.pagerank, js.pagerank);
        assert_close(name, "status", engine.status, js.status);
        assert_close(name, "impact", engine.impact, js.impact);
        assert_close(name, "priority", engine.priority, js.priority);
        assert_close(name, "recency", engine.recency, js.recency);
    }
}

#[test]
fn no_extra_presets_in_javascript() {
    let js_presets = load_js_presets();
    let engine_names: Vec<&str> = list_presets().iter().map(|p| p.as_str()).collect();
    for name in js_presets.keys() {
        assert!(
            engine_names.contains(&name.as_str()),
            "extra preset {name:?} found in JS"
        );
    }
}
