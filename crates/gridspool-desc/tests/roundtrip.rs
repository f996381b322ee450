//! Round-trip properties: text produced by the serializer re-parses to the
//! same attribute structure, whatever the original quoting style.

use gridspool_desc::{parse, unparse, unparse_batch, AttrValue, Description};

fn description(attrs: &[(&str, AttrValue)]) -> Description {
    let mut d = Description::new();
    for (name, value) in attrs {
        d.insert(name, value.clone());
    }
    d
}

fn plain(values: &[&str]) -> AttrValue {
    AttrValue::Plain(values.iter().map(|v| v.to_string()).collect())
}

fn groups(groups_in: &[&[&str]]) -> AttrValue {
    AttrValue::Groups(
        groups_in
            .iter()
            .map(|g| g.iter().map(|v| v.to_string()).collect())
            .collect(),
    )
}

#[test]
fn roundtrip_plain_values() {
    let d = description(&[
        ("executable", plain(&["run.sh"])),
        ("arguments", plain(&["--input", "data.txt", "7"])),
        ("stdout", plain(&["out.log"])),
    ]);

    let reparsed = parse(&unparse(&d)).unwrap();
    assert_eq!(reparsed, vec![d]);
}

#[test]
fn roundtrip_value_groups() {
    let d = description(&[
        ("executable", plain(&["run.sh"])),
        (
            "inputfiles",
            groups(&[&["job.sh", "/tmp/job.sh"], &["data", "srm://grid.example.org/data"]]),
        ),
        ("outputfiles", groups(&[&["result.tar", ""]])),
    ]);

    let reparsed = parse(&unparse(&d)).unwrap();
    assert_eq!(reparsed, vec![d]);
}

#[test]
fn roundtrip_values_with_spaces_and_punctuation() {
    let d = description(&[
        ("jobname", plain(&["analysis run #4 (final)"])),
        ("environment", plain(&["KEY=value with spaces", "X=1;Y=2"])),
    ]);

    let reparsed = parse(&unparse(&d)).unwrap();
    assert_eq!(reparsed, vec![d]);
}

#[test]
fn roundtrip_value_containing_double_quote() {
    let d = description(&[("note", plain(&[r#"she said "go""#]))]);

    let text = unparse(&d);
    assert!(text.contains(r#"'she said "go"'"#));
    assert_eq!(parse(&text).unwrap(), vec![d]);
}

#[test]
fn roundtrip_single_attribute_description() {
    let d = description(&[("count", plain(&["1"]))]);

    let text = unparse(&d);
    assert!(text.starts_with('&'));
    assert_eq!(parse(&text).unwrap(), vec![d]);
}

#[test]
fn roundtrip_multi_job_batch() {
    let batch = vec![
        description(&[("executable", plain(&["a.sh"])), ("count", plain(&["1"]))]),
        description(&[("executable", plain(&["b.sh"]))]),
        description(&[("inputfiles", groups(&[&["x", "/tmp/x"]]))]),
    ];

    let text = unparse_batch(&batch).unwrap();
    assert!(text.starts_with('+'));
    assert_eq!(parse(&text).unwrap(), batch);
}

#[test]
fn roundtrip_batch_of_one_equals_single() {
    let d = description(&[("executable", plain(&["a.sh"]))]);

    assert_eq!(unparse_batch(&[d.clone()]).unwrap(), unparse(&d));
    assert_eq!(parse(&unparse_batch(&[d.clone()]).unwrap()).unwrap(), vec![d]);
}

#[test]
fn quoting_style_is_not_significant() {
    let double = parse(r#"&(executable="run.sh")"#).unwrap();
    let single = parse("&(executable='run.sh')").unwrap();
    let bare = parse("&(executable=run.sh)").unwrap();

    assert_eq!(double, single);
    assert_eq!(double, bare);
}
