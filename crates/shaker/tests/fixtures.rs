use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use shaker::ast::js_ast::JsAst;
use shaker::logger::init_logger;
use shaker::{collect_outcomes, transform_sources, Config, Source};

struct Fixture {
    name: String,
    config: Config,
    input: Source,
    expected: String,
}

fn normalize(path: &str, code: &str) -> String {
    JsAst::new(path, code).unwrap().generate().unwrap()
}

fn load_fixtures() -> Vec<Fixture> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let pattern = root.join("*/input.js");
    let mut inputs = glob(pattern.to_str().unwrap())
        .unwrap()
        .map(|entry| entry.unwrap())
        .collect::<Vec<PathBuf>>();
    inputs.sort();
    inputs
        .into_iter()
        .map(|input| {
            let dir = input.parent().unwrap();
            let name = dir.file_name().unwrap().to_string_lossy().to_string();
            let config =
                Config::from_json(&fs::read_to_string(dir.join("config.json")).unwrap()).unwrap();
            let expected = normalize(
                "output.js",
                &fs::read_to_string(dir.join("output.js")).unwrap(),
            );
            Fixture {
                input: Source::new(
                    format!("{}/input.js", name),
                    fs::read_to_string(&input).unwrap(),
                ),
                name,
                config,
                expected,
            }
        })
        .collect()
}

#[test]
fn fixtures() {
    init_logger();
    let fixtures = load_fixtures();
    assert!(fixtures.len() >= 10);

    for fixture in &fixtures {
        let outcomes = transform_sources(std::slice::from_ref(&fixture.input), &fixture.config);
        let (_, output) = collect_outcomes(outcomes).unwrap().remove(0);
        let actual = output
            .kept_exports
            .or(output.exports_removed)
            .or(output.side_effects_removed)
            .unwrap_or_else(|| panic!("{}: no policy enabled", fixture.name));
        assert_eq!(actual, fixture.expected, "fixture {}", fixture.name);
    }
}

#[test]
fn fixtures_in_one_batch() {
    let fixtures = load_fixtures();
    let config = Config::from_json(r#"{ "removeSideEffects": true }"#).unwrap();
    let sources = fixtures
        .iter()
        .map(|fixture| fixture.input.clone())
        .collect::<Vec<_>>();
    let outcomes = collect_outcomes(transform_sources(&sources, &config)).unwrap();

    assert_eq!(
        outcomes
            .iter()
            .map(|(path, _)| path.clone())
            .collect::<Vec<_>>(),
        sources
            .iter()
            .map(|source| source.path.clone())
            .collect::<Vec<_>>()
    );
    let removed = outcomes
        .iter()
        .map(|(path, output)| (path.split('/').next().unwrap(), output.removed_calls))
        .filter(|(_, count)| *count > 0)
        .collect::<Vec<_>>();
    assert_eq!(
        removed,
        vec![
            ("base", 2),
            ("hooks", 2),
            ("mix-import-react", 3),
            ("multi-import", 1),
            ("redeclare", 1),
            ("rename-import-react", 3),
        ]
    );
}
