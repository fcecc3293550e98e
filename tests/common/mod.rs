//! Shared fixture host for the engine tests: a scope with registered
//! declarations, a literal-folding expression service with a "runtime only"
//! global table, and helpers for building entry registries.

use std::collections::HashMap;

use callfunc::{
    ArgExpr, CallError, DataType, DeclId, EntryPoint, EntryRegistry, ExpressionService,
    MatchMode, MethodDecl, ScopeInfo, TypedValue,
};

/// A class scope holding a fixed set of method declarations.
pub struct FixtureScope {
    valid: bool,
    methods: Vec<(MethodDecl, isize)>,
}

impl FixtureScope {
    pub fn new() -> Self {
        Self {
            valid: true,
            methods: Vec::new(),
        }
    }

    /// A scope whose descriptor is itself unusable.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, decl: MethodDecl, offset: isize) -> Self {
        self.methods.push((decl, offset));
        self
    }

    fn arity_of(arglist: &str) -> usize {
        let trimmed = arglist.trim();
        if trimmed.is_empty() {
            0
        } else {
            trimmed.split(',').count()
        }
    }

    fn receiver_ok(decl: &MethodDecl, receiver_const: bool) -> bool {
        // A const receiver can only reach const methods.
        !receiver_const || decl.is_const
    }
}

impl ScopeInfo for FixtureScope {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn find_by_arglist(
        &self,
        name: &str,
        arglist: &str,
        receiver_const: bool,
    ) -> Option<(MethodDecl, isize)> {
        let arity = Self::arity_of(arglist);
        self.methods
            .iter()
            .find(|(decl, _)| {
                decl.name == name
                    && decl.params.len() == arity
                    && Self::receiver_ok(decl, receiver_const)
            })
            .map(|(decl, offset)| (decl.clone(), *offset))
    }

    fn find_by_prototype(
        &self,
        name: &str,
        proto: &[DataType],
        receiver_const: bool,
        mode: MatchMode,
    ) -> Option<(MethodDecl, isize)> {
        self.methods
            .iter()
            .find(|(decl, _)| {
                decl.name == name
                    && decl.params.len() == proto.len()
                    && Self::receiver_ok(decl, receiver_const)
                    && proto
                        .iter()
                        .zip(&decl.params)
                        .all(|(from, to)| from.can_convert_to(*to, mode))
            })
            .map(|(decl, offset)| (decl.clone(), *offset))
    }
}

/// Expression service that constant-folds literals and resolves a fixed set
/// of names only through its "compiled" tier.
pub struct FixtureExprs {
    globals: HashMap<String, TypedValue>,
}

impl FixtureExprs {
    pub fn new() -> Self {
        Self {
            globals: HashMap::new(),
        }
    }

    /// Register a name that evaluates only via compilation.
    pub fn with_global(mut self, name: &str, value: TypedValue) -> Self {
        self.globals.insert(name.to_string(), value);
        self
    }
}

impl ExpressionService for FixtureExprs {
    fn find_arg_exprs(&self, text: &str) -> Vec<ArgExpr> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.split(',').map(|s| ArgExpr::new(s.trim())).collect()
    }

    fn eval_constant(&self, expr: &ArgExpr) -> Option<TypedValue> {
        let text = expr.text();
        match text {
            "true" => return Some(TypedValue::Bool(true)),
            "false" => return Some(TypedValue::Bool(false)),
            _ => {}
        }
        if let Ok(v) = text.parse::<i32>() {
            return Some(TypedValue::I32(v));
        }
        if text.contains('.') {
            if let Ok(v) = text.parse::<f64>() {
                return Some(TypedValue::F64(v));
            }
        }
        None
    }

    fn eval_compiled(&self, text: &str) -> Result<TypedValue, CallError> {
        self.globals
            .get(text)
            .copied()
            .ok_or_else(|| CallError::EvalFailure { expr: text.into() })
    }
}

/// int Bar(int, double): deterministic fixture body, returns int(a * b).
pub fn bar_decl(id: u64) -> MethodDecl {
    MethodDecl::new(
        DeclId::new(id),
        "Bar",
        vec![
            DataType::plain(callfunc::TypeKind::Int32),
            DataType::plain(callfunc::TypeKind::Double),
        ],
        DataType::plain(callfunc::TypeKind::Int32),
    )
}

pub fn bar_entry() -> EntryPoint {
    EntryPoint::new(|frame| {
        let a = frame.arg_i64(0).unwrap_or(0) as f64;
        let b = frame.arg_f64(1).unwrap_or(0.0);
        frame.set_return((a * b) as i32);
    })
}

/// Registry with `Bar` compiled under the given declaration id.
pub fn bar_registry(id: u64) -> EntryRegistry {
    let mut registry = EntryRegistry::new();
    registry.register(DeclId::new(id), bar_entry());
    registry
}
