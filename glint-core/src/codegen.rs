//! GLSL code generation
//!
//! Converts an optimized program into GLSL 4.50 source for one requested
//! shader stage. Interface locations are assigned sequentially in
//! declaration order and recorded so tooling can recover the ABI between
//! connected stages.

use crate::ast::*;
use crate::error::{CompilerError, Result};
use std::collections::HashMap;
use std::fmt::Write;

pub struct CodeGenerator {
    input_locations: HashMap<String, u32>,
    output_locations: HashMap<String, u32>,
    next_input_location: u32,
    next_output_location: u32,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            input_locations: HashMap::new(),
            output_locations: HashMap::new(),
            next_input_location: 0,
            next_output_location: 0,
        }
    }

    /// Emit GLSL for the first declaration matching `stage`; other
    /// declarations are ignored. Location counters restart from zero on
    /// every call.
    pub fn generate_glsl(&mut self, program: &Program, stage: ShaderStage) -> Result<String> {
        self.next_input_location = 0;
        self.next_output_location = 0;
        self.input_locations.clear();
        self.output_locations.clear();

        let shader = program
            .declarations
            .iter()
            .find(|decl| decl.stage == stage)
            .ok_or_else(|| {
                CompilerError::CodeGenError(format!(
                    "No shader declaration found for type: {}",
                    stage
                ))
            })?;

        let mut output = String::new();
        writeln!(output, "#version 450").unwrap();
        writeln!(output).unwrap();

        for input in &shader.inputs {
            let location = self.next_input_location;
            self.next_input_location += 1;
            self.input_locations.insert(input.name.clone(), location);
            writeln!(
                output,
                "layout(location = {}) in {} {};",
                location, input.ty, input.name
            )
            .unwrap();
        }
        if !shader.inputs.is_empty() {
            writeln!(output).unwrap();
        }

        for out in &shader.outputs {
            let location = self.next_output_location;
            self.next_output_location += 1;
            self.output_locations.insert(out.name.clone(), location);
            writeln!(
                output,
                "layout(location = {}) out {} {};",
                location, out.ty, out.name
            )
            .unwrap();
        }
        if !shader.outputs.is_empty() {
            writeln!(output).unwrap();
        }

        writeln!(output, "void main() {{").unwrap();
        for statement in &shader.statements {
            writeln!(
                output,
                "    {} = {};",
                emit_expression(&statement.target),
                emit_expression(&statement.value)
            )
            .unwrap();
        }
        writeln!(output, "}}").unwrap();

        Ok(output)
    }

    pub fn input_location(&self, name: &str) -> Option<u32> {
        self.input_locations.get(name).copied()
    }

    pub fn output_location(&self, name: &str) -> Option<u32> {
        self.output_locations.get(name).copied()
    }
}

/// Binary operators come out fully parenthesized, so the emitted text does
/// not depend on GLSL's own precedence rules.
fn emit_expression(expr: &Expression) -> String {
    match expr {
        Expression::BinaryOp(op, left, right) => format!(
            "({} {} {})",
            emit_expression(left),
            op.symbol(),
            emit_expression(right)
        ),
        Expression::Identifier(name) => name.clone(),
        Expression::Literal(text) => text.clone(),
        Expression::MemberAccess(object, member) => {
            format!("{}.{}", emit_expression(object), member)
        }
        Expression::FunctionCall(name, args) => {
            let arguments: Vec<String> = args.iter().map(emit_expression).collect();
            format!("{}({})", name, arguments.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::parser::Parser;

    fn parse(source: &str) -> Program {
        Parser::new(tokenize(source).unwrap()).parse().unwrap()
    }

    #[test]
    fn test_emits_canonical_vertex_shader() {
        let program = parse(
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

        let mut codegen = CodeGenerator::new();
        let glsl = codegen.generate_glsl(&program, ShaderStage::Vertex).unwrap();

        assert_eq!(
            glsl,
            "#version 450\n\
             \n\
             layout(location = 0) in vec3 inPosition;\n\
             layout(location = 1) in vec3 inColor;\n\
             \n\
             layout(location = 0) out vec3 fragColor;\n\
             \n\
             void main() {\n\
             \x20   gl_Position = vec4(inPosition, 1.0);\n\
             \x20   fragColor = inColor;\n\
             }\n"
        );
    }

    #[test]
    fn test_empty_interface_blocks_produce_no_blank_lines() {
        let program = parse("shader fragment { main { gl_FragDepth = 0.5; } }");
        let mut codegen = CodeGenerator::new();
        let glsl = codegen
            .generate_glsl(&program, ShaderStage::Fragment)
            .unwrap();

        assert_eq!(
            glsl,
            "#version 450\n\n\
             void main() {\n\
             \x20   gl_FragDepth = 0.5;\n\
             }\n"
        );
    }

    #[test]
    fn test_locations_follow_declaration_order() {
        let program = parse(
            "shader vertex { input vec3 a; input vec2 b; input float c; \
             output vec4 d; output vec3 e; \
             main { gl_Position = vec4(a, 1.0); } }",
        );

        let mut codegen = CodeGenerator::new();
        let glsl = codegen.generate_glsl(&program, ShaderStage::Vertex).unwrap();

        assert!(glsl.contains("layout(location = 0) in vec3 a;"));
        assert!(glsl.contains("layout(location = 1) in vec2 b;"));
        assert!(glsl.contains("layout(location = 2) in float c;"));
        assert!(glsl.contains("layout(location = 0) out vec4 d;"));
        assert!(glsl.contains("layout(location = 1) out vec3 e;"));

        assert_eq!(codegen.input_location("b"), Some(1));
        assert_eq!(codegen.output_location("e"), Some(1));
        assert_eq!(codegen.input_location("missing"), None);

        // A second call restarts the counters.
        let again = codegen.generate_glsl(&program, ShaderStage::Vertex).unwrap();
        assert_eq!(glsl, again);
    }

    #[test]
    fn test_selects_first_matching_stage() {
        let program = parse(
            "shader vertex { main { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); } } \
             shader fragment { output vec4 color; main { color = vec4(1.0, 0.0, 0.0, 1.0); } }",
        );

        let mut codegen = CodeGenerator::new();
        let glsl = codegen
            .generate_glsl(&program, ShaderStage::Fragment)
            .unwrap();

        assert!(glsl.contains("color ="));
        assert!(!glsl.contains("gl_Position"));
    }

    #[test]
    fn test_missing_stage_is_an_error() {
        let program = parse("shader vertex { main { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); } }");
        let mut codegen = CodeGenerator::new();
        let err = codegen
            .generate_glsl(&program, ShaderStage::Fragment)
            .unwrap_err();

        match err {
            CompilerError::CodeGenError(message) => {
                assert!(message.contains("fragment"), "{}", message);
            }
            other => panic!("expected CodeGenError, got {:?}", other),
        }
    }

    #[test]
    fn test_binary_operators_fully_parenthesized() {
        let program = parse("shader vertex { main { gl_Position = vec4(a + b * c, 0.0, 0.0, 1.0); } }");
        let mut codegen = CodeGenerator::new();
        let glsl = codegen.generate_glsl(&program, ShaderStage::Vertex).unwrap();
        assert!(glsl.contains("(a + (b * c))"), "{}", glsl);
    }

    #[test]
    fn test_member_access_emission() {
        let program = parse("shader fragment { input vec4 base; output vec4 color; \
                             main { color = vec4(base.xyz, 1.0); } }");
        let mut codegen = CodeGenerator::new();
        let glsl = codegen
            .generate_glsl(&program, ShaderStage::Fragment)
            .unwrap();
        assert!(glsl.contains("color = vec4(base.xyz, 1.0);"), "{}", glsl);
    }
}
