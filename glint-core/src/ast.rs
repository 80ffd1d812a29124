use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub declarations: Vec<ShaderDecl>,
}

impl Program {
    /// Total node count, counting the program node itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .declarations
            .iter()
            .map(ShaderDecl::node_count)
            .sum::<usize>()
    }

    pub fn statement_count(&self) -> usize {
        self.declarations.iter().map(|d| d.statements.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// File suffix glslangValidator uses to infer the stage.
    pub fn file_extension(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vert",
            ShaderStage::Fragment => "frag",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

impl FromStr for ShaderStage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "vertex" => Ok(ShaderStage::Vertex),
            "fragment" => Ok(ShaderStage::Fragment),
            other => Err(format!(
                "invalid shader type '{}', must be 'vertex' or 'fragment'",
                other
            )),
        }
    }
}

/// The DSL type set, identical to the GLSL subset the generator emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    Float,
    Int,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Vec2 => "vec2",
            TypeName::Vec3 => "vec3",
            TypeName::Vec4 => "vec4",
            TypeName::Mat4 => "mat4",
            TypeName::Float => "float",
            TypeName::Int => "int",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDecl {
    pub stage: ShaderStage,
    pub inputs: Vec<VariableDecl>,
    pub outputs: Vec<VariableDecl>,
    pub statements: Vec<Assignment>,
}

impl ShaderDecl {
    pub fn node_count(&self) -> usize {
        1 + self.inputs.len()
            + self.outputs.len()
            + self
                .statements
                .iter()
                .map(Assignment::node_count)
                .sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub ty: TypeName,
    pub name: String,
}

/// The only statement kind in the grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Expression,
    pub value: Expression,
}

impl Assignment {
    pub fn node_count(&self) -> usize {
        1 + self.target.node_count() + self.value.node_count()
    }

    /// The variable this assignment writes: the identifier itself, or the
    /// base identifier of a member-access target.
    pub fn target_name(&self) -> Option<&str> {
        match &self.target {
            Expression::Identifier(name) => Some(name),
            Expression::MemberAccess(object, _) => match &**object {
                Expression::Identifier(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal, kept as written (or as re-rendered by the optimizer).
    Literal(String),
    Identifier(String),
    BinaryOp(BinaryOp, Box<Expression>, Box<Expression>),
    /// Swizzle or field access; the base is a plain identifier by grammar.
    MemberAccess(Box<Expression>, String),
    /// Free function or type constructor such as `vec4(...)`.
    FunctionCall(String, Vec<Expression>),
}

impl Expression {
    pub fn node_count(&self) -> usize {
        match self {
            Expression::Literal(_) | Expression::Identifier(_) => 1,
            Expression::BinaryOp(_, left, right) => 1 + left.node_count() + right.node_count(),
            Expression::MemberAccess(object, _) => 1 + object.node_count(),
            Expression::FunctionCall(_, args) => {
                1 + args.iter().map(Expression::node_count).sum::<usize>()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
        }
    }
}
