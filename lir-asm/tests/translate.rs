//! End-to-end translation of syntax trees into printed modules

use lir_asm::ast::*;
use lir_asm::{translate, translate_with, GenConfig, TranslationError};
use lir_common::SourceLocation;
use lir_ir::{Constant, LocalIdent, Term, Type};
use pretty_assertions::assert_eq;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn i32t() -> TypeNode {
    TypeNode::int(32)
}

fn block(name: Option<&str>, insts: Vec<InstNode>, term: TermKindNode) -> BlockNode {
    BlockNode {
        name: name.map(LocalIdent::from),
        insts,
        term: TermNode::new(term),
    }
}

fn body(blocks: Vec<BlockNode>) -> FuncBody {
    FuncBody {
        blocks,
        use_list_orders: Vec::new(),
    }
}

fn ret_i32(value: i128) -> TermKindNode {
    TermKindNode::Ret {
        x: Some(TypedValue::int(32, value)),
    }
}

/// `define i32 @name() { ret i32 0 }`
fn trivial_func(name: &str) -> TopLevelEntity {
    TopLevelEntity::Func(FuncNode::define(
        FuncHeader::new(name, i32t(), vec![]),
        body(vec![block(None, vec![], ret_i32(0))]),
    ))
}

fn call_node(ret: TypeNode, callee: &str, args: Vec<TypedValue>) -> CallNode {
    CallNode {
        calling_conv: None,
        ret_attrs: Vec::new(),
        typ: ret,
        callee: ValueNode::Const(ConstNode::Global(callee.into())),
        args: args
            .into_iter()
            .map(|value| ArgNode {
                value,
                attrs: Vec::new(),
            })
            .collect(),
        func_attrs: Vec::new(),
    }
}

#[test]
fn test_translation_matches_builder() {
    init_logger();
    let tree = Module::new(vec![
        TopLevelEntity::SourceFilename("a.c".to_string()),
        TopLevelEntity::Global(GlobalNode::new("counter", i32t(), Some(ConstNode::Int(0)))),
        trivial_func("main"),
    ]);
    let translated = translate(&tree).unwrap();

    let mut built = lir_ir::Module::new();
    built.source_filename = Some("a.c".to_string());
    built.new_global_def("counter", Constant::i32(0)).unwrap();
    let main = built.new_func("main", Type::i32(), vec![]).unwrap();
    built
        .func_mut(main)
        .new_block(None)
        .set_term(Term::ret(Some(Constant::i32(0).into())).unwrap());

    assert_eq!(translated.to_string(), built.to_string());
    assert_eq!(
        translated.to_string(),
        "source_filename = \"a.c\"\n\
         \n\
         @counter = global i32 0\n\
         \n\
         define i32 @main() {\n\
         0:\n\
         \tret i32 0\n\
         }\n"
    );
}

#[test]
fn test_call_to_function_defined_later() {
    init_logger();
    let call = InstNode::new(
        Some("r"),
        InstKindNode::Call {
            tail: None,
            flags: Vec::new(),
            call: call_node(i32t(), "callee", vec![TypedValue::int(32, 7)]),
        },
    );
    let caller = FuncNode::define(
        FuncHeader::new("caller", i32t(), vec![]),
        body(vec![block(
            Some("entry"),
            vec![call],
            TermKindNode::Ret {
                x: Some(TypedValue::local(i32t(), "r")),
            },
        )]),
    );
    let callee = FuncNode::declare(FuncHeader::new(
        "callee",
        i32t(),
        vec![ParamNode::new(i32t(), None)],
    ));
    let tree = Module::new(vec![
        TopLevelEntity::Func(caller),
        TopLevelEntity::Func(callee),
    ]);

    let text = translate(&tree).unwrap().to_string();
    assert_eq!(
        text,
        "define i32 @caller() {\n\
         entry:\n\
         \t%r = call i32 @callee(i32 7)\n\
         \tret i32 %r\n\
         }\n\
         \n\
         declare i32 @callee(i32)\n"
    );
}

#[test]
fn test_loop_with_forward_references() {
    init_logger();
    let phi = InstNode::new(
        Some("i"),
        InstKindNode::Phi {
            typ: i32t(),
            incs: vec![
                IncomingNode {
                    x: ValueNode::int(0),
                    pred: LocalIdent::from("entry"),
                },
                IncomingNode {
                    x: ValueNode::local("next"),
                    pred: LocalIdent::from("loop"),
                },
            ],
        },
    );
    let next = InstNode::new(
        Some("next"),
        InstKindNode::Binary {
            op: "add".to_string(),
            flags: Vec::new(),
            x: TypedValue::local(i32t(), "i"),
            y: ValueNode::int(1),
        },
    );
    let done = InstNode::new(
        Some("done"),
        InstKindNode::ICmp {
            pred: "eq".to_string(),
            x: TypedValue::local(i32t(), "next"),
            y: ValueNode::local("n"),
        },
    );
    let func = FuncNode::define(
        FuncHeader::new("count", i32t(), vec![ParamNode::new(i32t(), Some("n"))]),
        body(vec![
            block(
                Some("entry"),
                vec![],
                TermKindNode::Br {
                    target: LocalIdent::from("loop"),
                },
            ),
            block(
                Some("loop"),
                vec![phi, next, done],
                TermKindNode::CondBr {
                    cond: TypedValue::local(TypeNode::int(1), "done"),
                    target_true: LocalIdent::from("exit"),
                    target_false: LocalIdent::from("loop"),
                },
            ),
            block(
                Some("exit"),
                vec![],
                TermKindNode::Ret {
                    x: Some(TypedValue::local(i32t(), "next")),
                },
            ),
        ]),
    );

    let text = translate(&Module::new(vec![TopLevelEntity::Func(func)]))
        .unwrap()
        .to_string();
    assert_eq!(
        text,
        "define i32 @count(i32 %n) {\n\
         entry:\n\
         \tbr label %loop\n\
         \n\
         loop:\n\
         \t%i = phi i32 [ 0, %entry ], [ %next, %loop ]\n\
         \t%next = add i32 %i, 1\n\
         \t%done = icmp eq i32 %next, %n\n\
         \tbr i1 %done, label %exit, label %loop\n\
         \n\
         exit:\n\
         \tret i32 %next\n\
         }\n"
    );
}

#[test]
fn test_forward_block_address() {
    init_logger();
    let slot = GlobalNode::new(
        "target",
        TypeNode::pointer(TypeNode::int(8)),
        Some(ConstNode::BlockAddress {
            func: "f".into(),
            block: LocalIdent::from("bb"),
        }),
    );
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::Void, vec![]),
        body(vec![block(Some("bb"), vec![], TermKindNode::Ret { x: None })]),
    );
    let tree = Module::new(vec![TopLevelEntity::Global(slot), TopLevelEntity::Func(func)]);

    let text = translate(&tree).unwrap().to_string();
    assert!(
        text.starts_with("@target = global i8* blockaddress(@f, %bb)\n"),
        "{}",
        text
    );
}

#[test]
fn test_block_address_of_missing_block() {
    init_logger();
    let slot = GlobalNode::new(
        "target",
        TypeNode::pointer(TypeNode::int(8)),
        Some(ConstNode::BlockAddress {
            func: "f".into(),
            block: LocalIdent::from("nope"),
        }),
    );
    let tree = Module::new(vec![TopLevelEntity::Global(slot), trivial_func("f")]);
    let err = translate(&tree).unwrap_err();
    assert!(
        matches!(err.root(), TranslationError::UnknownLocal { .. }),
        "{}",
        err
    );
    assert_eq!(
        err.to_string(),
        "@f at <unknown>:0:0: unable to locate local identifier %nope in function @f"
    );
}

#[test]
fn test_attribute_group_errors_name_the_group() {
    init_logger();
    let group = AttrGroupDefNode {
        id: 3,
        attrs: vec![AttrNode::ByVal(Some(TypeNode::named("missing")))],
        location: SourceLocation::new("m.ll", 7, 1),
    };
    let err = translate(&Module::new(vec![TopLevelEntity::AttrGroupDef(group)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "#3 at m.ll:7:1: unable to locate type definition of named type %missing"
    );
}

#[test]
fn test_skeleton_errors_follow_source_order() {
    init_logger();
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::named("missing"), vec![]),
        body(vec![block(None, vec![], TermKindNode::Ret { x: None })]),
    );
    let global = GlobalNode::new("g", TypeNode::named("missing"), None);
    let tree = Module::new(vec![TopLevelEntity::Func(func), TopLevelEntity::Global(global)]);
    let err = translate(&tree).unwrap_err();
    assert_eq!(
        err.to_string(),
        "@f at <unknown>:0:0: unable to locate type definition of named type %missing"
    );
}

#[test]
fn test_unknown_comdat() {
    init_logger();
    let mut global = GlobalNode::new("g", i32t(), Some(ConstNode::Int(1)));
    global.comdat = Some(ComdatNode::Named("missing".to_string()));
    let err = translate(&Module::new(vec![TopLevelEntity::Global(global)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "@g at <unknown>:0:0: unable to locate comdat identifier $missing"
    );
}

#[test]
fn test_implicit_comdat_names_owner() {
    init_logger();
    let mut global = GlobalNode::new("g", i32t(), Some(ConstNode::Int(1)));
    global.comdat = Some(ComdatNode::Implicit);
    let tree = Module::new(vec![
        TopLevelEntity::ComdatDef(ComdatDefNode {
            name: "g".to_string(),
            kind: "any".to_string(),
            location: Default::default(),
        }),
        TopLevelEntity::Global(global),
    ]);
    assert_eq!(
        translate(&tree).unwrap().to_string(),
        "$g = comdat any\n\
         \n\
         @g = global i32 1, comdat\n"
    );
}

#[test]
fn test_unknown_named_type() {
    init_logger();
    let global = GlobalNode::new("g", TypeNode::named("T"), None);
    let err = translate(&Module::new(vec![TopLevelEntity::Global(global)])).unwrap_err();
    assert!(
        matches!(err.root(), TranslationError::UnknownType { name } if name == "T"),
        "{}",
        err
    );
}

#[test]
fn test_recursive_named_struct() {
    init_logger();
    let node = TypeDefNode {
        name: "node".to_string(),
        typ: TypeNode::Struct {
            fields: vec![i32t(), TypeNode::pointer(TypeNode::named("node"))],
            packed: false,
        },
        location: Default::default(),
    };
    let head = GlobalNode::new("head", TypeNode::named("node"), Some(ConstNode::ZeroInitializer));
    let tree = Module::new(vec![TopLevelEntity::TypeDef(node), TopLevelEntity::Global(head)]);
    assert_eq!(
        translate(&tree).unwrap().to_string(),
        "%node = type { i32, %node* }\n\
         \n\
         @head = global %node zeroinitializer\n"
    );
}

fn struct_def(name: &str, fields: Vec<TypeNode>) -> TopLevelEntity {
    TopLevelEntity::TypeDef(TypeDefNode {
        name: name.to_string(),
        typ: TypeNode::Struct { fields, packed: false },
        location: Default::default(),
    })
}

#[test]
fn test_alloca_of_struct_with_repeated_field_type() {
    init_logger();
    let alloca = InstNode::new(
        Some("p"),
        InstKindNode::Alloca {
            elem_type: TypeNode::named("T"),
            count: None,
            align: None,
            addr_space: 0,
            in_alloca: false,
            swift_error: false,
        },
    );
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::Void, vec![]),
        body(vec![block(None, vec![alloca], TermKindNode::Ret { x: None })]),
    );
    let tree = Module::new(vec![
        struct_def("S", vec![i32t()]),
        struct_def("T", vec![TypeNode::named("S"), TypeNode::named("S")]),
        TopLevelEntity::Func(func),
    ]);
    assert_eq!(
        translate(&tree).unwrap().to_string(),
        "%S = type { i32 }\n\
         %T = type { %S, %S }\n\
         \n\
         define void @f() {\n\
         0:\n\
         \t%p = alloca %T\n\
         \tret void\n\
         }\n"
    );
}

#[test]
fn test_struct_alias_accepts_values_of_the_struct() {
    init_logger();
    let alias = TopLevelEntity::TypeDef(TypeDefNode {
        name: "A".to_string(),
        typ: TypeNode::named("S"),
        location: Default::default(),
    });
    let slot = GlobalNode::new("g", TypeNode::named("A"), Some(ConstNode::ZeroInitializer));
    let store = InstNode::new(
        None,
        InstKindNode::Store {
            src: TypedValue::new(TypeNode::named("S"), ValueNode::Const(ConstNode::ZeroInitializer)),
            dst: TypedValue::new(
                TypeNode::pointer(TypeNode::named("A")),
                ValueNode::Const(ConstNode::Global("g".into())),
            ),
            volatile: false,
            atomic: None,
            align: None,
        },
    );
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::Void, vec![]),
        body(vec![block(None, vec![store], TermKindNode::Ret { x: None })]),
    );
    let tree = Module::new(vec![
        struct_def("S", vec![i32t()]),
        alias,
        TopLevelEntity::Global(slot),
        TopLevelEntity::Func(func),
    ]);
    assert_eq!(
        translate(&tree).unwrap().to_string(),
        "%S = type { i32 }\n\
         %A = type %S\n\
         \n\
         @g = global %S zeroinitializer\n\
         \n\
         define void @f() {\n\
         0:\n\
         \tstore %S zeroinitializer, %S* @g\n\
         \tret void\n\
         }\n"
    );
}

/// `@a = alias i32, <target>` written before anything it refers to
fn alias_to(content_type: TypeNode, target: ExprNode) -> IndirectSymbolNode {
    IndirectSymbolNode {
        name: "a".into(),
        kind: IndirectKind::Alias,
        clauses: LinkageNode::default(),
        content_type,
        target: IndirectTarget::Expr(target),
        partition: None,
        location: Default::default(),
    }
}

#[test]
fn test_alias_takes_address_space_of_gep_target() {
    init_logger();
    let table = TypeNode::Array {
        len: 4,
        elem: Box::new(i32t()),
    };
    let gep = ExprNode::GetElementPtr {
        in_bounds: true,
        elem_type: table.clone(),
        src: TypedConst::new(
            TypeNode::Pointer {
                elem: Box::new(table.clone()),
                addr_space: 1,
            },
            ConstNode::Global("x".into()),
        ),
        indices: vec![
            TypedConst::new(TypeNode::int(64), ConstNode::Int(0)),
            TypedConst::new(TypeNode::int(64), ConstNode::Int(1)),
        ],
    };
    let mut alias = alias_to(i32t(), gep);
    alias.partition = Some("p".to_string());
    let mut x = GlobalNode::new("x", table, Some(ConstNode::ZeroInitializer));
    x.addr_space = 1;
    let tree = Module::new(vec![TopLevelEntity::IndirectSymbol(alias), TopLevelEntity::Global(x)]);

    let module = translate(&tree).unwrap();
    assert_eq!(module.aliases()[0].typ().to_string(), "i32 addrspace(1)*");
    let text = module.to_string();
    assert!(
        text.contains(
            "@a = alias i32, getelementptr inbounds ([4 x i32], [4 x i32] addrspace(1)* @x, i64 0, i64 1), partition \"p\"\n"
        ),
        "{}",
        text
    );
}

#[test]
fn test_alias_to_comparison_is_unsupported() {
    init_logger();
    let cmp = ExprNode::ICmp {
        pred: "eq".to_string(),
        x: TypedConst::new(i32t(), ConstNode::Int(1)),
        y: TypedConst::new(i32t(), ConstNode::Int(2)),
    };
    let tree = Module::new(vec![TopLevelEntity::IndirectSymbol(alias_to(TypeNode::int(1), cmp))]);
    let err = translate(&tree).unwrap_err();
    assert!(
        matches!(err.root(), TranslationError::Unsupported { .. }),
        "{}",
        err
    );
}

#[test]
fn test_duplicate_global() {
    init_logger();
    let tree = Module::new(vec![
        TopLevelEntity::Global(GlobalNode::new("main", i32t(), None)),
        trivial_func("main"),
    ]);
    let err = translate(&tree).unwrap_err();
    assert!(
        matches!(err.root(), TranslationError::DuplicateGlobal { ident } if ident == "@main"),
        "{}",
        err
    );
}

fn func_with_param_id(id: u64) -> Module {
    let mut param = ParamNode::new(i32t(), None);
    param.name = Some(LocalIdent::Id(id));
    let func = FuncNode::define(
        FuncHeader::new("f", i32t(), vec![param]),
        body(vec![block(
            None,
            vec![],
            TermKindNode::Ret {
                x: Some(TypedValue::new(i32t(), ValueNode::Local(LocalIdent::Id(id)))),
            },
        )]),
    );
    Module::new(vec![TopLevelEntity::Func(func)])
}

#[test]
fn test_local_ids_out_of_sequence() {
    init_logger();
    let tree = func_with_param_id(7);
    let err = translate(&tree).unwrap_err();
    assert_eq!(
        err.to_string(),
        "@f at <unknown>:0:0: invalid local ID in function @f, expected %0, got %7"
    );

    let config = GenConfig {
        strict_local_ids: false,
        ..GenConfig::default()
    };
    let module = translate_with(&tree, &config).unwrap();
    assert_eq!(
        module.to_string(),
        "define i32 @f(i32 %0) {\n\
         1:\n\
         \tret i32 %0\n\
         }\n"
    );
}

#[test]
fn test_void_instruction_cannot_be_named() {
    init_logger();
    let store = InstNode::new(
        Some("s"),
        InstKindNode::Store {
            src: TypedValue::int(32, 1),
            dst: TypedValue::new(
                TypeNode::pointer(i32t()),
                ValueNode::Const(ConstNode::Null),
            ),
            volatile: false,
            atomic: None,
            align: None,
        },
    );
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::Void, vec![]),
        body(vec![block(None, vec![store], TermKindNode::Ret { x: None })]),
    );
    let err = translate(&Module::new(vec![TopLevelEntity::Func(func)])).unwrap_err();
    assert!(matches!(err.root(), TranslationError::Contract(_)), "{}", err);
}

#[test]
fn test_store_type_mismatch() {
    init_logger();
    let store = InstNode::new(
        None,
        InstKindNode::Store {
            src: TypedValue::int(64, 0),
            dst: TypedValue::local(TypeNode::pointer(TypeNode::int(8)), "p"),
            volatile: false,
            atomic: None,
            align: None,
        },
    );
    let func = FuncNode::define(
        FuncHeader::new(
            "f",
            TypeNode::Void,
            vec![ParamNode::new(TypeNode::pointer(TypeNode::int(8)), Some("p"))],
        ),
        body(vec![block(None, vec![store], TermKindNode::Ret { x: None })]),
    );
    let err = translate(&Module::new(vec![TopLevelEntity::Func(func)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "store in @f at <unknown>:0:0: store operands are not compatible: src=i64; dst=i8*"
    );
}

#[test]
fn test_insert_value_type_mismatch() {
    init_logger();
    let insert = InstNode::new(
        None,
        InstKindNode::InsertValue {
            x: TypedValue::new(
                TypeNode::Struct {
                    fields: vec![TypeNode::int(64)],
                    packed: false,
                },
                ValueNode::Const(ConstNode::Undef),
            ),
            elem: TypedValue::int(32, 1),
            indices: vec![0],
        },
    );
    let func = FuncNode::define(
        FuncHeader::new("f", TypeNode::Void, vec![]),
        body(vec![block(None, vec![insert], TermKindNode::Ret { x: None })]),
    );
    let err = translate(&Module::new(vec![TopLevelEntity::Func(func)])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "insertvalue in @f at <unknown>:0:0: insertvalue elem type mismatch, expected i64, got i32"
    );
}

#[test]
fn test_parallel_matches_sequential() {
    init_logger();
    let mut entities = Vec::new();
    for i in 0..16 {
        let name = format!("f{}", i);
        let next = format!("f{}", (i + 1) % 16);
        let call = InstNode::new(
            None,
            InstKindNode::Call {
                tail: Some("tail".to_string()),
                flags: Vec::new(),
                call: call_node(i32t(), &next, vec![]),
            },
        );
        entities.push(TopLevelEntity::Func(FuncNode::define(
            FuncHeader::new(&name, i32t(), vec![]),
            body(vec![block(
                None,
                vec![call],
                TermKindNode::Ret {
                    x: Some(TypedValue::new(i32t(), ValueNode::Local(LocalIdent::Id(1)))),
                },
            )]),
        )));
    }
    let tree = Module::new(entities);

    let sequential = translate(&tree).unwrap().to_string();
    let parallel = translate_with(&tree, &GenConfig::parallel()).unwrap().to_string();
    assert_eq!(sequential, parallel);
    assert!(
        sequential.contains("define i32 @f3() {\n0:\n\t%1 = tail call i32 @f4()\n\tret i32 %1\n}"),
        "{}",
        sequential
    );
}

#[test]
fn test_errors_are_reported_in_parallel_mode() {
    init_logger();
    let bad = FuncNode::define(
        FuncHeader::new("bad", i32t(), vec![]),
        body(vec![block(
            None,
            vec![],
            TermKindNode::Ret {
                x: Some(TypedValue::local(i32t(), "missing")),
            },
        )]),
    );
    let tree = Module::new(vec![trivial_func("ok"), TopLevelEntity::Func(bad)]);
    let err = translate_with(&tree, &GenConfig::parallel()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "ret in @bad at <unknown>:0:0: unable to locate local identifier %missing in function @bad"
    );
}
