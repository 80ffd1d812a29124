use super::*;
use crate::lexer::tokenize;

/// Parse input and return the Program, panicking on failure.
fn parse_ok(input: &str) -> Program {
    let tokens = tokenize(input).expect("tokenize failed");
    Parser::new(tokens).parse().unwrap_or_else(|e| {
        panic!("parse failed: {:?}", e);
    })
}

/// Parse input and return the single ShaderDecl.
fn single_shader(input: &str) -> ShaderDecl {
    let program = parse_ok(input);
    assert_eq!(program.declarations.len(), 1, "expected exactly one shader");
    program.declarations.into_iter().next().unwrap()
}

/// Wrap a statement list into a vertex shader and return its parsed body.
fn parse_statements(body: &str) -> Vec<Assignment> {
    single_shader(&format!("shader vertex {{ main {{ {} }} }}", body)).statements
}

fn parse_err(input: &str) -> CompilerError {
    let tokens = tokenize(input).expect("tokenize failed");
    match Parser::new(tokens).parse() {
        Ok(program) => panic!("expected parse error, got {:#?}", program),
        Err(e) => e,
    }
}

fn ident(name: &str) -> Expression {
    Expression::Identifier(name.to_string())
}

#[test]
fn test_parse_canonical_vertex_shader() {
    let shader = single_shader(
        r#"
shader vertex {
  input  vec3 inPosition;
  input  vec3 inColor;
  output vec3 fragColor;
  main {
    gl_Position = vec4(inPosition, 1.0);
    fragColor = inColor;
  }
}
"#,
    );

    assert_eq!(shader.stage, ShaderStage::Vertex);
    assert_eq!(shader.inputs.len(), 2);
    assert_eq!(shader.outputs.len(), 1);
    assert_eq!(shader.inputs[0].ty, TypeName::Vec3);
    assert_eq!(shader.inputs[0].name, "inPosition");
    assert_eq!(shader.outputs[0].name, "fragColor");

    assert_eq!(shader.statements.len(), 2);
    assert_eq!(shader.statements[0].target, ident("gl_Position"));
    assert_eq!(
        shader.statements[0].value,
        Expression::FunctionCall(
            "vec4".to_string(),
            vec![ident("inPosition"), Expression::Literal("1.0".to_string())],
        )
    );
}

#[test]
fn test_parse_empty_source() {
    let program = parse_ok("");
    assert!(program.declarations.is_empty());
}

#[test]
fn test_parse_both_stages() {
    let program = parse_ok(
        "shader vertex { main { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); } } \
         shader fragment { output vec4 color; main { color = vec4(1.0, 0.0, 0.0, 1.0); } }",
    );
    assert_eq!(program.declarations.len(), 2);
    assert_eq!(program.declarations[0].stage, ShaderStage::Vertex);
    assert_eq!(program.declarations[1].stage, ShaderStage::Fragment);
}

#[test]
fn test_operator_precedence() {
    // a + b * c parses with '+' at the root and '*' under its right child.
    let statements = parse_statements("x = a + b * c;");
    assert_eq!(
        statements[0].value,
        Expression::BinaryOp(
            BinaryOp::Add,
            Box::new(ident("a")),
            Box::new(Expression::BinaryOp(
                BinaryOp::Multiply,
                Box::new(ident("b")),
                Box::new(ident("c")),
            )),
        )
    );
}

#[test]
fn test_parentheses_override_precedence() {
    let statements = parse_statements("x = (a + b) * c;");
    assert_eq!(
        statements[0].value,
        Expression::BinaryOp(
            BinaryOp::Multiply,
            Box::new(Expression::BinaryOp(
                BinaryOp::Add,
                Box::new(ident("a")),
                Box::new(ident("b")),
            )),
            Box::new(ident("c")),
        )
    );
}

#[test]
fn test_left_associativity() {
    // a - b - c parses as ((a - b) - c).
    let statements = parse_statements("x = a - b - c;");
    assert_eq!(
        statements[0].value,
        Expression::BinaryOp(
            BinaryOp::Subtract,
            Box::new(Expression::BinaryOp(
                BinaryOp::Subtract,
                Box::new(ident("a")),
                Box::new(ident("b")),
            )),
            Box::new(ident("c")),
        )
    );
}

#[test]
fn test_member_access() {
    let statements = parse_statements("x = position.xyz;");
    assert_eq!(
        statements[0].value,
        Expression::MemberAccess(Box::new(ident("position")), "xyz".to_string())
    );
}

#[test]
fn test_member_access_target() {
    let statements = parse_statements("color.rgb = base;");
    assert_eq!(
        statements[0].target,
        Expression::MemberAccess(Box::new(ident("color")), "rgb".to_string())
    );
}

#[test]
fn test_function_call_without_arguments() {
    let statements = parse_statements("x = noise();");
    assert_eq!(
        statements[0].value,
        Expression::FunctionCall("noise".to_string(), vec![])
    );
}

#[test]
fn test_nested_constructor_call() {
    let statements = parse_statements("x = vec4(base.xyz, 1.0 + offset);");
    match &statements[0].value {
        Expression::FunctionCall(name, args) => {
            assert_eq!(name, "vec4");
            assert_eq!(args.len(), 2);
            assert!(matches!(args[0], Expression::MemberAccess(_, _)));
            assert!(matches!(args[1], Expression::BinaryOp(BinaryOp::Add, _, _)));
        }
        other => panic!("expected function call, got {:?}", other),
    }
}

#[test]
fn test_type_constructor_requires_parenthesis() {
    let err = parse_err("shader vertex { main { x = vec4; } }");
    match err {
        CompilerError::ParseError { message, .. } => {
            assert!(message.contains("type constructor"), "{}", message);
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_missing_semicolon() {
    let err = parse_err("shader vertex { main { x = a } }");
    match err {
        CompilerError::ParseError { message, found, .. } => {
            assert!(message.contains("';'"), "{}", message);
            assert_eq!(found, "}");
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_unexpected_token_in_shader_body() {
    // `uniform` is lexed as a keyword but the grammar has no use for it.
    let err = parse_err("shader vertex { uniform mat4 mvp; }");
    assert!(matches!(err, CompilerError::ParseError { .. }));
}

#[test]
fn test_literal_assignment_target_rejected() {
    let err = parse_err("shader vertex { main { 1.0 = x; } }");
    match err {
        CompilerError::ParseError { message, found, line } => {
            assert!(message.contains("target"), "{}", message);
            assert_eq!(found, "1.0");
            assert_eq!(line, 1);
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_call_assignment_target_rejected() {
    let err = parse_err("shader vertex { main { vec4(x) = y; } }");
    assert!(matches!(err, CompilerError::ParseError { .. }));
}

#[test]
fn test_unexpected_end_of_file() {
    let err = parse_err("shader vertex { main { x = a + ");
    match err {
        CompilerError::ParseError { found, .. } => assert_eq!(found, "<eof>"),
        other => panic!("expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_top_level_must_be_shader() {
    let err = parse_err("main { x = 1.0; }");
    match err {
        CompilerError::ParseError { message, .. } => {
            assert!(message.contains("'shader'"), "{}", message);
        }
        other => panic!("expected ParseError, got {:?}", other),
    }
}
