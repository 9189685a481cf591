//! End-to-end tests: action traces in, program artifacts out.

use std::collections::HashMap;
use std::fs;
use std::process::Command;

use test_log::test;

use quadra::Compiler;
use quadra::codegen::{OpCode, ProgramArtifact, QuadGenerator, Quadruple, Slot};
use quadra::error::{QuadraError, SemanticError};
use quadra::lexer::lex;
use quadra::semantic::{ATTRIBUTES, GLOBAL_CLASS};
use quadra::trace;
use quadra::types::Literal;

fn compile(source: &str) -> ProgramArtifact {
    match Compiler::new().compile(source) {
        Ok(artifact) => artifact,
        Err(e) => panic!("compilation failed: {}", e),
    }
}

fn compile_error(source: &str) -> SemanticError {
    match Compiler::new().compile(source) {
        Err(QuadraError::Semantic { source, .. }) => source,
        Err(other) => panic!("expected a semantic error, got {}", other),
        Ok(_) => panic!("expected compilation to fail"),
    }
}

/// Replays a trace into a generator and returns it with the replay result,
/// so tests can inspect what was emitted before a failure.
fn replay_partial(source: &str) -> (QuadGenerator, Result<(), QuadraError>) {
    let lines = trace::parse(lex(source).unwrap()).unwrap();
    let mut generator = QuadGenerator::new();
    let result = trace::replay(&mut generator, &lines);
    (generator, result)
}

/// Global int attributes are allocated in declaration order from 5000.
fn global_address(name: &str) -> u32 {
    let index = DECLARED_GLOBALS
        .iter()
        .position(|g| *g == name)
        .unwrap_or_else(|| panic!("unknown global {}", name));
    5000 + index as u32
}

/// Integer globals used by the control-flow programs, in declaration order.
const DECLARED_GLOBALS: [&str; 4] = ["x", "y", "i", "s"];

const GLOBALS: &str = "
declare_type int
declare_variable x
declare_variable y
declare_variable i
declare_variable s
";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Executes a single-function program and returns what it wrote.
fn simulate(artifact: &ProgramArtifact) -> Vec<String> {
    let mut memory: HashMap<u32, Value> = HashMap::new();
    for (address, literal) in &artifact.constant_segment {
        let value = match literal {
            Literal::Int(v) => Value::Int(*v),
            Literal::Float(v) => Value::Float(v.into_inner()),
            Literal::Bool(v) => Value::Bool(*v),
            _ => continue,
        };
        memory.insert(*address, value);
    }
    let load = |memory: &HashMap<u32, Value>, slot: &Slot| -> Value {
        match slot {
            Slot::Address(a) => *memory.get(a).unwrap_or_else(|| panic!("read of unset {}", a)),
            other => panic!("not an address: {:?}", other),
        }
    };
    let store = |memory: &mut HashMap<u32, Value>, slot: &Slot, value: Value| match slot {
        Slot::Address(a) => {
            memory.insert(*a, value);
        }
        other => panic!("not an address: {:?}", other),
    };

    let mut output = Vec::new();
    let mut pc = 0;
    for _ in 0..10_000 {
        let Quadruple { op, left, right, result } = &artifact.quadruples[pc];
        pc += 1;
        match op {
            OpCode::Goto => pc = artifact.quadruples[pc - 1].target().unwrap(),
            OpCode::Gotof => {
                if load(&memory, left) == Value::Bool(false) {
                    pc = artifact.quadruples[pc - 1].target().unwrap();
                }
            }
            OpCode::Assign => {
                let value = load(&memory, left);
                store(&mut memory, result, value);
            }
            OpCode::Write => match result {
                Slot::Address(a) => match artifact.constant_segment.get(a) {
                    Some(Literal::Str(text)) => output.push(text.clone()),
                    _ => output.push(match load(&memory, result) {
                        Value::Int(v) => v.to_string(),
                        Value::Float(v) => v.to_string(),
                        Value::Bool(v) => v.to_string(),
                    }),
                },
                other => panic!("write of {:?}", other),
            },
            OpCode::End => return output,
            binary => {
                let (Value::Int(l), Value::Int(r)) = (load(&memory, left), load(&memory, right)) else {
                    panic!("simulator only handles int arithmetic");
                };
                let value = match binary {
                    OpCode::Plus => Value::Int(l + r),
                    OpCode::Minus => Value::Int(l - r),
                    OpCode::Times => Value::Int(l * r),
                    OpCode::Less => Value::Bool(l < r),
                    OpCode::Greater => Value::Bool(l > r),
                    OpCode::Equal => Value::Bool(l == r),
                    other => panic!("unsupported {}", other),
                };
                store(&mut memory, result, value);
            }
        }
    }
    panic!("program did not terminate");
}

fn main_program(body: &str) -> String {
    format!(
        "{}\ndeclare_type void\ndeclare_function main\nfunction_body_begin\nprogram_entry\n{}\nfunction_end main\n",
        GLOBALS, body
    )
}

#[test]
fn sum_assignment_uses_distinct_constants() {
    let artifact = compile(&main_program(
        "push_operand 2\npush_operator +\npush_operand 3\nreduce additive\nassign x",
    ));
    let x = global_address("x");
    let plus = &artifact.quadruples[1];
    assert_eq!(plus.op, OpCode::Plus);
    let (Slot::Address(two), Slot::Address(three), Slot::Address(temp)) =
        (&plus.left, &plus.right, &plus.result)
    else {
        panic!("unexpected operands {}", plus);
    };
    assert_ne!(two, three);
    assert_eq!(artifact.constant_segment[two], Literal::Int(2));
    assert_eq!(artifact.constant_segment[three], Literal::Int(3));
    assert_eq!(
        artifact.quadruples[2],
        Quadruple::new(OpCode::Assign, Slot::Address(*temp), Slot::Empty, Slot::Address(x))
    );
    assert!(artifact.data_segment.contains(&x));
}

#[test]
fn float_into_int_is_rejected() {
    let err = compile_error(&main_program("push_operand 7.0\nassign s"));
    assert!(matches!(err, SemanticError::AssignmentMismatch { .. }));
}

#[test]
fn one_address_per_distinct_literal() {
    let artifact = compile(&main_program(
        "push_operand 7\nassign x\npush_operand 7\nassign y\npush_operand 8\nassign i",
    ));
    assert_eq!(artifact.constant_segment.len(), 2);
    assert_eq!(artifact.quadruples[1].left, artifact.quadruples[2].left);
    assert_ne!(artifact.quadruples[1].left, artifact.quadruples[3].left);
}

#[test]
fn read_before_assignment_fails() {
    let err = compile_error(&main_program("push_operand y\nassign x"));
    assert_eq!(err, SemanticError::UsedBeforeAssignment("y".into()));
    compile(&main_program("push_operand 1\nassign y\npush_operand y\nassign x\npush_operand y\nassign x"));
}

fn if_else_program(x: i64) -> String {
    main_program(&format!(
        "push_operand {x}
assign x
push_operand x
push_operator >
push_operand 0
reduce relational
if_test
push_operand 1
assign y
else_branch
push_operand 2
assign y
end_if
push_operand y
write"
    ))
}

#[test]
fn if_else_targets_follow_each_branch() {
    let artifact = compile(&if_else_program(5));
    let gotof = artifact
        .quadruples
        .iter()
        .position(|q| q.op == OpCode::Gotof)
        .unwrap();
    let exit = artifact.quadruples[gotof + 1..]
        .iter()
        .position(|q| q.op == OpCode::Goto)
        .map(|p| p + gotof + 1)
        .unwrap();
    // Else branch starts right after the exit jump; the exit jump lands after it.
    assert_eq!(artifact.quadruples[gotof].target(), Some(exit + 1));
    assert_eq!(artifact.quadruples[exit].target(), Some(exit + 2));

    assert_eq!(simulate(&artifact), vec!["1"]);
    assert_eq!(simulate(&compile(&if_else_program(-5))), vec!["2"]);
}

#[test]
fn while_loop_runs_to_completion() {
    let artifact = compile(&main_program(
        "push_operand 0
assign i
push_operand 0
assign s
while_header
push_operand i
push_operator <
push_operand 4
reduce relational
if_test
push_operand s
push_operator +
push_operand i
reduce additive
assign s
push_operand i
push_operator +
push_operand 1
reduce additive
assign i
end_while
push_operand s
write
write \"done\"",
    ));
    assert_eq!(simulate(&artifact), vec!["6", "done"]);
}

#[test]
fn nested_if_inside_while_patches_independently() {
    let artifact = compile(&main_program(
        "push_operand 0
assign i
push_operand 0
assign s
while_header
push_operand i
push_operator <
push_operand 5
reduce relational
if_test
push_operand i
push_operator ==
push_operand 2
reduce relational
if_test
write \"two\"
end_if
push_operand i
push_operator +
push_operand 1
reduce additive
assign i
end_while",
    ));
    assert_eq!(simulate(&artifact), vec!["two"]);
}

const ANIMALS: &str = "
declare_class A
set_access private
declare_type int
declare_variable secret
set_access public
declare_type void
declare_function init
function_body_begin
push_operand 1
assign secret
push_operand secret
write
function_end
finish_class
declare_class B
set_parent A
declare_type int
declare_function peek
function_body_begin
";

#[test]
fn private_attribute_is_visible_in_its_own_class_only() {
    let err = compile_error(&format!("{}push_operand secret\nreturn\n", ANIMALS));
    assert_eq!(err, SemanticError::PrivateAccess("secret".into()));

    let artifact = compile(&format!("{}push_operand 3\nreturn\nfunction_end\nfinish_class\n", ANIMALS));
    assert_eq!(artifact.symbol_table["B"].parent.as_deref(), Some("A"));
    assert!(artifact.function("A", "init").is_some());
}

const ADD: &str = "
declare_type int
declare_function add
enter_params
declare_type int
declare_variable a
declare_variable b
exit_params
function_body_begin
push_operand a
push_operator +
push_operand b
reduce additive
return
function_end
declare_type void
declare_function main
function_body_begin
program_entry
";

#[test]
fn too_few_arguments_never_reach_gosub() {
    let (generator, result) = replay_partial(&format!(
        "{}begin_call add\nbegin_params\npush_operand 1\npass_param\nend_params\n",
        ADD
    ));
    assert!(matches!(
        result,
        Err(QuadraError::Semantic {
            source: SemanticError::ArgumentCountMismatch { expected: 2, given: 1, .. },
            ..
        })
    ));
    assert!(!generator.quadruples().iter().any(|q| q.op == OpCode::Gosub));
}

#[test]
fn too_many_arguments_never_reach_gosub() {
    let (generator, result) = replay_partial(&format!(
        "{}begin_call add
begin_params
push_operand 1
pass_param
advance_param
push_operand 2
pass_param
advance_param
",
        ADD
    ));
    assert!(matches!(
        result,
        Err(QuadraError::Semantic {
            source: SemanticError::TooManyArguments { expected: 2, .. },
            ..
        })
    ));
    assert!(!generator.quadruples().iter().any(|q| q.op == OpCode::Gosub));
}

#[test]
fn mismatched_argument_names_its_position() {
    let err = compile_error(&format!(
        "{}begin_call add\nbegin_params\npush_operand 1\npass_param\nadvance_param\npush_operand 'c'\npass_param\n",
        ADD
    ));
    assert_eq!(err.to_string(), "add expecting type int for parameter 2");
}

#[test]
fn nested_calls_bind_outer_arguments() {
    let artifact = compile(&format!(
        "{}declare_type int
declare_variable r
begin_call add
begin_params
begin_call add
begin_params
push_operand 1
pass_param
advance_param
push_operand 2
pass_param
end_params
end_call
pass_param
advance_param
push_operand 3
pass_param
end_params
end_call
assign r
function_end main
",
        ADD
    ));
    let params: Vec<&Slot> = artifact
        .quadruples
        .iter()
        .filter(|q| q.op == OpCode::Param)
        .map(|q| &q.result)
        .collect();
    assert_eq!(
        params,
        vec![&Slot::Position(0), &Slot::Position(1), &Slot::Position(0), &Slot::Position(1)]
    );
    let add = artifact.function(GLOBAL_CLASS, "add").unwrap();
    assert_eq!(add.param_count, 2);
    let era = artifact.quadruples.iter().find(|q| q.op == OpCode::Era).unwrap();
    assert_eq!(era.right, Slot::Size(add.param_count + add.local_count));
    let gosubs = artifact.quadruples.iter().filter(|q| q.op == OpCode::Gosub).count();
    assert_eq!(gosubs, 2);
}

#[test]
fn return_jumps_land_on_the_epilogue() {
    let artifact = compile(ADD.trim_end_matches(
        "declare_type void\ndeclare_function main\nfunction_body_begin\nprogram_entry\n",
    ));
    let end = artifact
        .quadruples
        .iter()
        .position(|q| q.op == OpCode::EndProc)
        .unwrap();
    assert_eq!(artifact.quadruples[end - 1].target(), Some(end));
    assert!(artifact.function(GLOBAL_CLASS, ATTRIBUTES).is_none());
}

const KENNEL: &str = "
declare_class Animal
set_access private
declare_type int
declare_variable legs
set_access public
declare_variable age
declare_type void
declare_function init
function_body_begin
push_operand 0
assign age
function_end
declare_type int
declare_function speak
function_body_begin
push_operand 4
return
function_end
finish_class
declare_class Dog
set_parent Animal
declare_type void
declare_function init
function_body_begin
call_parent Animal
begin_params
end_params
end_parent_call
function_end
finish_class
declare_type Dog
declare_variable rex
declare_type int
declare_variable total
declare_type void
declare_function main
function_body_begin
program_entry
switch_instance rex
begin_call speak
begin_params
end_params
end_call
assign total
switch_instance rex
attribute_call age
end_call
assign total
function_end main
";

#[test]
fn members_are_reached_through_an_instance() {
    let artifact = compile(KENNEL);
    let ops: Vec<OpCode> = artifact.quadruples.iter().map(|q| q.op).collect();
    let first = ops.iter().position(|op| *op == OpCode::SwitchInstance).unwrap();
    assert_eq!(
        ops[first..first + 11].to_vec(),
        vec![
            OpCode::SwitchInstance,
            OpCode::Era,
            OpCode::Gosub,
            OpCode::ExitInstances,
            OpCode::GetReturn,
            OpCode::Assign,
            OpCode::SwitchInstance,
            OpCode::Return,
            OpCode::ExitInstances,
            OpCode::GetReturn,
            OpCode::Assign,
        ]
    );

    // rex is the first global reference, age the second Animal attribute.
    let rex = Slot::Address(9000);
    assert_eq!(artifact.quadruples[first].left, rex);
    assert_eq!(artifact.quadruples[first + 6].left, rex);
    assert_eq!(artifact.quadruples[first + 2].left, Slot::Name("speak".into()));
    assert_eq!(artifact.quadruples[first + 7].left, Slot::Address(10001));

    // Dog's init runs Animal's init through the parent call.
    let dog_init = artifact.function("Dog", "init").unwrap().start.unwrap();
    assert_eq!(
        artifact.quadruples[dog_init..]
            .iter()
            .find(|q| q.op == OpCode::Gosub)
            .map(|q| &q.left),
        Some(&Slot::Name("init".into()))
    );
}

#[test]
fn private_attribute_is_hidden_through_an_instance() {
    let source = KENNEL.replace("attribute_call age", "attribute_call legs");
    assert_eq!(compile_error(&source), SemanticError::PrivateAccess("legs".into()));
}

#[test]
fn quadc_writes_json_artifact() {
    let dir = std::env::temp_dir().join(format!("quadc-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("sum.trace");
    let output = dir.join("sum.json");
    fs::write(
        &input,
        main_program("push_operand 2\npush_operator +\npush_operand 3\nreduce + -\nassign x"),
    )
    .unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_quadc"))
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("failed to run quadc");
    assert!(status.success());

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["quadruples"][0][0], "goto");
    assert_eq!(json["quadruples"][1][0], "+");
    assert_eq!(json["data_segment"][0], 5000);

    let listing = Command::new(env!("CARGO_BIN_EXE_quadc"))
        .args(["--check", "--listing"])
        .arg(&input)
        .output()
        .expect("failed to run quadc");
    assert!(listing.status.success());
    let stdout = String::from_utf8_lossy(&listing.stdout);
    assert!(stdout.contains("(goto, _, _, 1)"));
    assert!(stdout.contains("ok"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn quadc_reports_semantic_errors() {
    let dir = std::env::temp_dir().join(format!("quadc-err-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let input = dir.join("bad.trace");
    fs::write(&input, "declare_class A\ndeclare_class A\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_quadc"))
        .arg(&input)
        .output()
        .expect("failed to run quadc");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr: {}", stderr);

    let _ = fs::remove_dir_all(&dir);
}
