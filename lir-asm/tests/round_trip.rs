//! Syntax trees handed over as JSON

use lir_asm::ast::{self, TopLevelEntity};
use lir_asm::translate_json;
use lir_common::LirError;
use pretty_assertions::assert_eq;

const GETTER: &str = r#"{
  "entities": [
    { "global": {
        "name": { "Name": "answer" },
        "immutable": true,
        "content_type": { "int": 32 },
        "init": { "int": 42 }
    } },
    { "func": {
        "header": {
          "name": { "Name": "get" },
          "ret_type": { "int": 32 },
          "func_attrs": [ { "group": 0 } ]
        },
        "body": { "blocks": [ {
          "insts": [ { "kind": { "load": {
            "elem_type": { "int": 32 },
            "src": {
              "typ": { "pointer": { "elem": { "int": 32 } } },
              "value": { "const": { "global": { "Name": "answer" } } }
            },
            "align": 4
          } } } ],
          "term": { "kind": { "ret": { "x": {
            "typ": { "int": 32 },
            "value": { "local": { "Id": 1 } }
          } } } }
        } ] }
    } },
    { "attr_group_def": { "id": 0, "attrs": [ { "keyword": "nounwind" } ] } }
  ]
}"#;

#[test]
fn test_translate_json() {
    let _ = env_logger::builder().is_test(true).try_init();
    let module = translate_json(GETTER).unwrap();
    assert_eq!(
        module.to_string(),
        "@answer = constant i32 42\n\
         \n\
         define i32 @get() #0 {\n\
         0:\n\
         \t%1 = load i32, i32* @answer, align 4\n\
         \tret i32 %1\n\
         }\n\
         \n\
         attributes #0 = { nounwind }\n"
    );
}

#[test]
fn test_tree_survives_serialization() {
    let tree = ast::Module::from_json(GETTER).unwrap();
    assert_eq!(tree.entities.len(), 3);
    assert!(matches!(tree.entities[1], TopLevelEntity::Func(_)));

    let again = ast::Module::from_json(&tree.to_json().unwrap()).unwrap();
    assert_eq!(again, tree);
    assert_eq!(
        lir_asm::translate(&again).unwrap().to_string(),
        translate_json(GETTER).unwrap().to_string()
    );
}

#[test]
fn test_malformed_json_is_an_input_error() {
    let err = translate_json(r#"{ "entities": [ { "global": 3 } ] }"#).unwrap_err();
    assert!(matches!(err, LirError::Input { .. }), "{}", err);
}

#[test]
fn test_translation_errors_keep_their_location() {
    let json = r#"{ "entities": [ { "global": {
        "name": { "Name": "g" },
        "content_type": { "named": "missing" },
        "location": { "filename": "m.ll", "line": 3, "column": 1 }
    } } ] }"#;
    let err = translate_json(json).unwrap_err();
    assert_eq!(err.location().map(|l| l.line), Some(3));
    assert_eq!(
        err.to_string(),
        "Translation error at m.ll:3:1: @g at m.ll:3:1: unable to locate type definition of named type %missing"
    );
}
