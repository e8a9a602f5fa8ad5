use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use tdd::{
    config::Config,
    error::{Error, Result},
    interpreter::eval_as_hash,
    loader::{DataLoader, DataLoaderEnvironment, LoadContext},
    value::{Hash, Value},
};
use tempfile::TempDir;

fn s(v: &str) -> Value {
    Value::String(v.to_string())
}

fn config_for(dir: &Path) -> Config {
    Config { data_root: dir.to_path_buf(), ..Config::default() }
}

fn write(dir: &Path, name: &str, content: &[u8]) {
    fs::write(dir.join(name), content).unwrap();
}

fn eval_data(text: &str, config: &Config, data: &Hash) -> Result<Hash> {
    let mut env = DataLoaderEnvironment::new(config, data);
    eval_as_hash(text, Some(&mut env), false, None)
}

/// The error a failed function call was wrapped around.
fn cause_message(err: &Error) -> String {
    match err {
        Error::EvalError { cause: Some(cause), .. } => match cause.as_ref() {
            Error::DataLoaderError(message) => message.clone(),
            other => other.to_string(),
        },
        other => panic!("Expected a failed function call, got {other:?}"),
    }
}

#[test_log::test]
fn test_tdd_loaders() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common.tdd", b"name: Joe\nlist: tddSequence(items.tdd)\n");
    write(dir.path(), "items.tdd", b"1, two\n{k: v}\n");
    let config = config_for(dir.path());

    let map = eval_data("common: tdd(common.tdd)", &config, &Hash::new()).unwrap();
    let common = map["common"].as_hash().unwrap();
    assert_eq!(common["name"], s("Joe"));
    assert_eq!(
        common["list"],
        Value::Sequence(vec![
            Value::Integer(1),
            s("two"),
            Value::Hash(Hash::from([("k".to_string(), s("v"))])),
        ])
    );
}

#[test_log::test]
fn test_tdd_loader_merges_into_hash() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "defaults.tdd", b"a: 1, b: 2");
    let config = config_for(dir.path());

    let map = eval_data("tdd(defaults.tdd)\nb: 3", &config, &Hash::new()).unwrap();
    assert_eq!(map["a"], Value::Integer(1));
    assert_eq!(map["b"], Value::Integer(3));
}

#[test_log::test]
fn test_tdd_loader_reads_encoding_header() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "pl.tdd", b"# encoding: ISO-8859-2\nword: \xb1\n");
    let config = config_for(dir.path());

    let map = eval_data("x: tdd(pl.tdd)", &config, &Hash::new()).unwrap();
    assert_eq!(map["x"].as_hash().unwrap()["word"], s("\u{105}"));
}

#[test_log::test]
fn test_syntax_error_in_loaded_file_names_the_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.tdd", b"a: [1, 2");
    let config = config_for(dir.path());

    let err = eval_data("x: tdd(broken.tdd)", &config, &Hash::new()).unwrap_err();
    let Error::EvalError { cause: Some(cause), .. } = &err else {
        panic!("Expected a failed function call, got {err:?}");
    };
    let location = cause.location().unwrap();
    assert!(location.file_name().unwrap().ends_with("broken.tdd"));
}

#[test_log::test]
fn test_text_loader() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "bom.txt", b"\xEF\xBB\xBFhello\n");
    write(dir.path(), "latin.txt", b"caf\xe9");
    let config = config_for(dir.path());

    let map = eval_data("a: text(bom.txt), b: text(latin.txt, ISO-8859-1)", &config, &Hash::new())
        .unwrap();
    assert_eq!(map["a"], s("hello\n"));
    assert_eq!(map["b"], s("café"));
}

#[test_log::test]
fn test_json_loader_keeps_order() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "data.json", br#"{"z": 1, "a": [true, 2.5], "m": {"s": "x"}}"#);
    let config = config_for(dir.path());

    let map = eval_data("j: json(data.json)", &config, &Hash::new()).unwrap();
    let json = map["j"].as_hash().unwrap();
    let keys: Vec<&str> = json.keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a", "m"]);
    let items = json["a"].as_sequence().unwrap();
    assert_eq!(items[0], Value::Boolean(true));
    assert!(matches!(items[1], Value::Decimal(_)));
    assert_eq!(json["m"].as_hash().unwrap()["s"], s("x"));
}

#[test_log::test]
fn test_json_null_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "null.json", b"{\"a\": null}");
    let config = config_for(dir.path());

    let err = eval_data("j: json(null.json)", &config, &Hash::new()).unwrap_err();
    assert_eq!(cause_message(&err), "JSON null is not supported");
}

#[test_log::test]
fn test_yaml_loader() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "data.yaml", b"name: Joe\nitems:\n  - 1\n  - two\nnested:\n  ok: true\n");
    let config = config_for(dir.path());

    let map = eval_data("y: yaml(data.yaml)", &config, &Hash::new()).unwrap();
    let yaml = map["y"].as_hash().unwrap();
    assert_eq!(yaml["name"], s("Joe"));
    assert_eq!(yaml["items"], Value::Sequence(vec![Value::Integer(1), s("two")]));
    assert_eq!(yaml["nested"].as_hash().unwrap()["ok"], Value::Boolean(true));
}

#[test_log::test]
fn test_properties_loader() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "app.properties", b"# settings\ntitle = Caf\xe9\nsize: 10\n");
    let config = config_for(dir.path());

    let map = eval_data("p: properties(app.properties)", &config, &Hash::new()).unwrap();
    let props = map["p"].as_hash().unwrap();
    assert_eq!(props["title"], s("Café"));
    assert_eq!(props["size"], s("10"));
}

fn row(entries: &[(&str, Value)]) -> Value {
    Value::Hash(entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
}

#[test_log::test]
fn test_csv_loader() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "birds.csv",
        b"\xEF\xBB\xBFname;wings:n;flies:b\nsparrow;2;true\n\"Emu; the big one\";2;false\nworm;;\n",
    );
    let config = config_for(dir.path());

    let map = eval_data("birds: csv(birds.csv)", &config, &Hash::new()).unwrap();
    assert_eq!(
        map["birds"],
        Value::Sequence(vec![
            row(&[("name", s("sparrow")), ("wings", Value::Integer(2)), ("flies", Value::Boolean(true))]),
            row(&[
                ("name", s("Emu; the big one")),
                ("wings", Value::Integer(2)),
                ("flies", Value::Boolean(false)),
            ]),
            row(&[("name", s("worm"))]),
        ])
    );
}

#[test_log::test]
fn test_csv_loader_options() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "prices.csv", b"Item Name , Price (EUR):n\n pen ,\"1,50\"\nink,-\n");
    write(dir.path(), "plain.csv", b"a,b\nc,d\n");
    let config = config_for(dir.path());

    let map = eval_data(
        "p: csv(prices.csv, {separator: ',', normalizeHeaders, trimCells, \
         decimalSeparator: ',', emptyValue: '-'})",
        &config,
        &Hash::new(),
    )
    .unwrap();
    let rows = map["p"].as_sequence().unwrap();
    let price = Value::Decimal(BigDecimal::from_str("1.50").unwrap());
    assert_eq!(rows[0], row(&[("item_name", s("pen")), ("price", price)]));
    assert_eq!(rows[1], row(&[("item_name", s("ink"))]));

    let map = eval_data(
        "given: csv(plain.csv, {separator: ',', headers: [x, y]})\n\
         replaced: csv(plain.csv, {separator: ',', replaceHeaders: [x, y]})",
        &config,
        &Hash::new(),
    )
    .unwrap();
    assert_eq!(
        map["given"],
        Value::Sequence(vec![row(&[("x", s("a")), ("y", s("b"))]), row(&[("x", s("c")), ("y", s("d"))])])
    );
    assert_eq!(map["replaced"], Value::Sequence(vec![row(&[("x", s("c")), ("y", s("d"))])]));
}

#[test_log::test]
fn test_csv_loader_errors() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "wide.csv", b"a;b\n1;2\n1;2;3\n");
    write(dir.path(), "typed.csv", b"n:n\nmany\n");
    let config = config_for(dir.path());
    let data = Hash::new();

    let err = eval_data("x: csv(wide.csv)", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "Row 3 contains more columns than the number of header cells.");

    let err = eval_data("x: csv(typed.csv)", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "Value \"many\" is not a valid number (row 2, column \"n\").");

    let err = eval_data("x: csv(wide.csv, {quote: '\"'})", &config, &data).unwrap_err();
    assert!(cause_message(&err).starts_with("Unknown option: \"quote\". The supported options are: encoding,"));

    let err = eval_data("x: csv(wide.csv, {headers: [a], replaceHeaders: [b]})", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Only one of the \"headers\" and \"replaceHeaders\" options can be used at once."
    );

    let err = eval_data("x: csv(wide.csv, ';')", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "The 2nd argument of csv(fileName[, options]) (options) must be a hash, but it is a(n) string"
    );
}

#[test_log::test]
fn test_sliced_text_loader() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lines.txt", b"first\r\nsecond\n\nfourth\n");
    write(dir.path(), "words.txt", b"caf\xe9 | tea | milk |");
    let config = config_for(dir.path());

    let map = eval_data(
        "lines: slicedText(lines.txt)\n\
         words: slicedText(words.txt, {separator: '|', trim, encoding: ISO-8859-1})\n\
         all: slicedText(words.txt, {separator: '|', encoding: ISO-8859-1, dropEmptyLastItem: false})",
        &config,
        &Hash::new(),
    )
    .unwrap();
    assert_eq!(
        map["lines"],
        Value::Sequence(vec![s("first"), s("second"), s(""), s("fourth")])
    );
    assert_eq!(map["words"], Value::Sequence(vec![s("café"), s("tea"), s("milk")]));
    assert_eq!(map["all"].as_sequence().unwrap().len(), 4);
}

#[test_log::test]
fn test_sliced_text_loader_errors() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "lines.txt", b"a\nb\n");
    let config = config_for(dir.path());
    let data = Hash::new();

    let err = eval_data("x: slicedText(lines.txt, {separator: ''})", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "The value of the \"separator\" option can't be 0 length string.");

    let err = eval_data("x: slicedText(lines.txt, {trim: yes})", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "The value of the \"trim\" option must be a boolean.");

    let err = eval_data("x: slicedText(lines.txt, {count: 2})", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Unknown option: \"count\". The supported options are: encoding, separator, trim, dropEmptyLastItem"
    );
}

#[test_log::test]
fn test_data_root_subdirectories() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write(&dir.path().join("sub"), "x.txt", b"inner");
    let config = config_for(dir.path());

    let map = eval_data("x: text(sub/x.txt)", &config, &Hash::new()).unwrap();
    assert_eq!(map["x"], s("inner"));
}

#[test_log::test]
fn test_loader_errors() {
    let config = Config::default();
    let data = Hash::new();

    let err = eval_data("x: nope(1)", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "Unknown data loader: nope");

    let err = eval_data("x: text()", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Wrong number of arguments, the call must look like text(fileName[, encoding])"
    );

    let err = eval_data("x: json(a.json, UTF-8)", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Wrong number of arguments, the call must look like json(fileName)"
    );

    let err = eval_data("x: tdd([1])", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "The 1st argument of tdd(fileName[, encoding]) (file name) must be a string, \
         but it is a(n) sequence"
    );
}

#[test_log::test]
fn test_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = config_for(dir.path());

    let err = eval_data("x: text(missing.txt)", &config, &Hash::new()).unwrap_err();
    let Error::EvalError { cause: Some(cause), .. } = &err else {
        panic!("Expected a failed function call, got {err:?}");
    };
    assert!(matches!(cause.as_ref(), Error::IoError(_)));
}

#[test]
fn test_get_earlier_keys() {
    let config = Config::default();
    let map = eval_data(
        "a: 1, b: get(a)\nh: {x: 2, y: get(x), z: get(a)}\np: {q: {r: 5}}, t: get(p, q, r)",
        &config,
        &Hash::new(),
    )
    .unwrap();
    assert_eq!(map["b"], Value::Integer(1));
    let h = map["h"].as_hash().unwrap();
    assert_eq!(h["y"], Value::Integer(2));
    assert_eq!(h["z"], Value::Integer(1));
    assert_eq!(map["t"], Value::Integer(5));
}

#[test]
fn test_get_inner_hash_shadows_outer() {
    let config = Config::default();
    let map = eval_data("a: 1, h: {a: 2, b: get(a)}, c: get(a)", &config, &Hash::new()).unwrap();
    assert_eq!(map["h"].as_hash().unwrap()["b"], Value::Integer(2));
    assert_eq!(map["c"], Value::Integer(1));
}

#[test]
fn test_get_does_not_see_hashes_in_sequences() {
    let config = Config::default();
    let data = Hash::new();

    let map = eval_data("a: 1, s: [{y: get(a)}]", &config, &data).unwrap();
    let items = map["s"].as_sequence().unwrap();
    assert_eq!(items[0].as_hash().unwrap()["y"], Value::Integer(1));

    let err = eval_data("s: [{x: 1, y: get(x)}]", &config, &data).unwrap_err();
    assert_eq!(cause_message(&err), "No variable with name \"x\" exists.");
}

#[test]
fn test_get_falls_back_to_data() {
    let config = Config::default();
    let data = Hash::from([("v".to_string(), s("pre")), ("a".to_string(), s("data"))]);
    let map = eval_data("a: 1, x: get(v), y: get(a)", &config, &data).unwrap();
    assert_eq!(map["x"], s("pre"));
    assert_eq!(map["y"], Value::Integer(1));
}

#[test]
fn test_get_errors() {
    let config = Config::default();
    let data = Hash::new();

    let err = eval_data("x: get()", &config, &data).unwrap_err();
    assert!(cause_message(&err).starts_with("Function \"get\" needs at least 1 arguments."));

    let err = eval_data("a: 1, x: get(a, b)", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Parameter at position 1 must be the name of a hash variable, but it is the name of \
         a number variable."
    );

    let err = eval_data("a: {b: 1}, x: get(a, c)", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "No sub-variable with name \"c\" exists (referred by parameter at position 2)."
    );

    let err = eval_data("x: get(1)", &config, &data).unwrap_err();
    assert_eq!(
        cause_message(&err),
        "Parameters to function \"get\" must be strings, but parameter at position 1 is a number."
    );
}

struct Upper;

impl DataLoader for Upper {
    fn load(&self, _ctx: LoadContext<'_>, args: &[Value]) -> Result<Value> {
        match args {
            [Value::String(text)] => Ok(Value::String(text.to_uppercase())),
            _ => Err(Error::DataLoaderError("upper(text) takes one string".to_string())),
        }
    }
}

#[test_log::test]
fn test_registered_loader() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "inner.tdd", b"shout: upper(inner)");
    let config = config_for(dir.path());
    let data = Hash::new();

    let mut env = DataLoaderEnvironment::new(&config, &data);
    env.register("upper", Arc::new(Upper));
    let map = eval_as_hash("a: upper(hi), b: tdd(inner.tdd)", Some(&mut env), false, None).unwrap();
    assert_eq!(map["a"], s("HI"));
    assert_eq!(map["b"].as_hash().unwrap()["shout"], s("INNER"));
}

#[test]
fn test_registered_loader_overrides_built_in() {
    let config = Config::default();
    let data = Hash::new();

    let mut env = DataLoaderEnvironment::new(&config, &data);
    env.register("text", Arc::new(Upper));
    let map = eval_as_hash("a: text(abc)", Some(&mut env), false, None).unwrap();
    assert_eq!(map["a"], s("ABC"));
}
