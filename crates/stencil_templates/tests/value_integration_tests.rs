//! Values of every shape rendered through compiled templates.

use pretty_assertions::assert_eq;
use stencil_core::{RenderError, Value};
use stencil_templates::{Template, TemplateError};

fn render(source: &str, data: Value) -> String {
    source.parse::<Template>().unwrap().render(data).unwrap()
}

#[derive(Debug, PartialEq)]
struct Person {
    name: String,
}

#[derive(Debug, PartialEq)]
struct Timestamp(u64);

#[test]
fn test_custom_value_extraction() {
    let person = Value::opaque(Person {
        name: "Struct".to_string(),
    });
    assert_eq!(person.downcast_ref::<Person>().unwrap().name, "Struct");
    assert!(person.downcast_ref::<Timestamp>().is_none());

    let cloned = person.clone();
    assert_eq!(cloned.downcast_ref::<Person>(), person.downcast_ref::<Person>());
}

#[test]
fn test_filters_receive_custom_values() {
    let name_of = Value::filter(|value| {
        Ok(match value.downcast_ref::<Person>() {
            Some(person) => Value::from(person.name.as_str()),
            None => Value::from("other"),
        })
    });
    let data = Value::map([
        ("string", Value::from("success")),
        ("custom", Value::opaque(Person { name: "custom1".to_string() })),
        ("f", name_of),
    ]);
    assert_eq!(render("{{f(custom)}},{{f(string)}}", data), "custom1,other");

    let stamp = Value::filter(|value| {
        Ok(Value::from(match value.downcast_ref::<Timestamp>() {
            Some(_) => "custom3",
            None => "other",
        }))
    });
    let data = Value::map([
        ("string", Value::from("success")),
        ("custom", Value::opaque(Timestamp(0))),
        ("f", stamp),
    ]);
    assert_eq!(render("{{f(custom)}},{{f(string)}}", data), "custom3,other");
}

#[test]
fn test_custom_value_lookup() {
    let person = Value::custom(
        Person {
            name: "Arthur".to_string(),
        },
        |person, key| match key {
            "name" => Some(Value::from(person.name.as_str())),
            _ => None,
        },
    );
    let data = Value::map([("person", person)]);
    assert_eq!(render("{{person.name}}|{{person.age}}|{{#person}}{{name}}{{/}}", data), "Arthur||Arthur");
}

#[test]
fn test_nested_sequences() {
    assert_eq!(render("{{#.}}{{.}}{{/}}", Value::from([0, 1, 2, 3])), "0123");
    assert_eq!(
        render("{{#.}}[{{#.}}{{.}},{{/}}],{{/}}", Value::from([[0, 1], [2, 3]])),
        "[0,1,],[2,3,],"
    );
    assert_eq!(
        render(
            "{{#.}}[{{#.}}[{{#.}}{{.}},{{/}}],{{/}}],{{/}}",
            Value::from([[[0, 1], [2, 3]], [[4, 5], [6, 7]]])
        ),
        "[[0,1,],[2,3,],],[[4,5,],[6,7,],],"
    );
}

#[test]
fn test_nested_sequences_of_maps() {
    let cell = |a: i64| Value::map([("a", a)]);
    let data = Value::sequence([
        Value::sequence([Value::sequence([cell(0), cell(1)]), Value::sequence([cell(2), cell(3)])]),
        Value::sequence([Value::sequence([cell(4), cell(5)]), Value::sequence([cell(6), cell(7)])]),
    ]);
    assert_eq!(
        render("{{#.}}[{{#.}}[{{#.}}{{a}},{{/}}],{{/}}],{{/}}", data),
        "[[0,1,],[2,3,],],[[4,5,],[6,7,],],"
    );
}

#[test]
fn test_each_exposes_keys_in_nested_collections() {
    let cell = |key: &str, n: i64| Value::map([(key, n)]);
    let pair = |a: i64, b: i64| {
        Value::sequence([cell(&a.to_string(), a), cell(&b.to_string(), b)])
    };
    let data = Value::map([(
        "a",
        Value::sequence([
            Value::sequence([pair(1, 2), pair(3, 4)]),
            Value::sequence([pair(5, 6), pair(7, 8)]),
        ]),
    )]);

    assert_eq!(
        render(
            "{{#a}}[{{#.}}[{{#.}}[{{#each(.)}}{{@key}}:{{.}}{{/}}]{{/}}]{{/}}]{{/}}",
            data
        ),
        "[[[1:1][2:2]][[3:3][4:4]]][[[5:5][6:6]][[7:7][8:8]]]"
    );
}

#[test]
fn test_each_positions() {
    let data = Value::map([("items", Value::from(["a", "b", "c"]))]);
    assert_eq!(
        render(
            "{{#each(items)}}{{@index}}={{.}}{{#@first}}<{{/}}{{^@last}},{{/}}{{/}}",
            data
        ),
        "0=a<,1=b,2=c"
    );

    let data = Value::map([("person", Value::map([("name", "Arthur"), ("age", "42")]))]);
    assert_eq!(
        render("{{#each(person)}}{{@key}}={{.}};{{/}}", data),
        "name=Arthur;age=42;"
    );
}

#[test]
fn test_builtin_lookups_and_standard_filters() {
    let data = Value::map([
        ("name", Value::from("arthur dent")),
        ("items", Value::from([1, 2, 3])),
        ("blank", Value::from("  ")),
    ]);
    assert_eq!(
        render(
            "{{name.length}} {{items.count}} {{items.first}} {{items.last}} \
             {{uppercase(name)}} {{capitalized(name)}} {{isBlank(blank)}} {{isEmpty(items)}}",
            data
        ),
        "11 3 1 3 ARTHUR DENT Arthur Dent true false"
    );

    let data = Value::map([("html", "<b>")]);
    assert_eq!(render("{{HTMLEscape(html)}}", data), "&lt;b&gt;");
}

#[test]
fn test_data_shadows_standard_library() {
    let data = Value::map([("uppercase", "shadowed")]);
    assert_eq!(render("{{uppercase}}", data), "shadowed");
}

#[test]
fn test_truthiness() {
    let source = "{{#v}}T{{/v}}{{^v}}F{{/v}}";
    let case = |v: Value| render(source, Value::map([("v", v)]));

    assert_eq!(case(Value::empty()), "F");
    assert_eq!(case(Value::from(false)), "F");
    assert_eq!(case(Value::sequence(Vec::<Value>::new())), "F");
    assert_eq!(case(Value::map(Vec::<(String, Value)>::new())), "F");
    assert_eq!(case(Value::from(0)), "T");
    assert_eq!(case(Value::from("")), "T");
    assert_eq!(case(Value::from(true)), "T");
}

#[test]
fn test_calling_a_non_filter_fails() {
    let template: Template = "{{name(x)}}".parse().unwrap();
    let err = template.render(Value::map([("name", "Arthur")])).unwrap_err();
    assert!(matches!(
        err,
        TemplateError::Render(RenderError::FilterNotCallable { name }) if name == "name"
    ));
}
