//! AST to IR Lowering
//!
//! Lowers a parsed module to Catalyst IR in two passes: every function
//! signature is declared first, then bodies are lowered in declaration
//! order, so forward references and mutual recursion always resolve.
//!
//! There is no type checker in front of this stage. Instruction selection
//! keys on the IR type of values already produced, and a node that fails
//! to lower logs to stderr and yields nothing; the surrounding lowering
//! carries on, and any structural damage is left for verification to
//! surface.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::ast::{self, BinOp, ExprKind, NumberKind, StmtKind, UnOp};

use super::builder::IrBuilder;
use super::instr::CmpOp;
use super::types::{IrType, Module, VReg};

/// The function name forced onto the host's entry signature
const ENTRY_POINT: &str = "main";

/// A declared function signature
#[derive(Debug, Clone)]
struct FnSig {
    params: Vec<IrType>,
    ret: IrType,
    is_vararg: bool,
}

/// Lowers an AST module to IR
pub struct Lowerer {
    builder: IrBuilder,
    /// Map from variable names to their stack slots. One flat namespace
    /// per function: re-declaring a name overwrites its binding for the
    /// rest of the function, nested blocks included.
    locals: HashMap<String, VReg>,
    /// Map from produced vregs to their IR types
    vreg_types: HashMap<VReg, IrType>,
    /// Declared function signatures, filled by the first pass
    fn_signatures: HashMap<String, FnSig>,
}

impl Lowerer {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            builder: IrBuilder::new(module_name),
            locals: HashMap::new(),
            vreg_types: HashMap::new(),
            fn_signatures: HashMap::new(),
        }
    }

    /// Lower a module. Pass 1 declares every signature so calls resolve
    /// regardless of definition order; pass 2 lowers bodies in order.
    pub fn lower_module(mut self, module: &ast::Module) -> Module {
        for func in &module.functions {
            self.declare_function(&func.proto);
        }
        for func in &module.functions {
            self.lower_function(func);
        }
        self.builder.finish()
    }

    /// Log a lowering failure for one node and yield nothing
    fn error(&self, message: &str) -> Option<VReg> {
        eprintln!("error: {}", message);
        None
    }

    // ============ Declarations ============

    fn declare_function(&mut self, proto: &ast::Prototype) {
        let params = if proto.name == ENTRY_POINT {
            // The host entry point gets (argc, argv) no matter what the
            // declared parameter list says
            vec![IrType::I32, IrType::ptr(IrType::ptr(IrType::I8))]
        } else {
            proto.params.iter().map(|p| ir_type(p.ty)).collect()
        };
        self.fn_signatures.insert(
            proto.name.clone(),
            FnSig {
                params,
                ret: ir_type(proto.return_type),
                is_vararg: false,
            },
        );
    }

    /// Resolve a callee by name, declaring the C runtime hooks on first use
    fn lookup_function(&mut self, name: &str) -> Option<FnSig> {
        if let Some(sig) = self.fn_signatures.get(name) {
            return Some(sig.clone());
        }
        let sig = match name {
            "printf" | "scanf" => FnSig {
                params: vec![IrType::ptr(IrType::I8)],
                ret: IrType::I32,
                is_vararg: true,
            },
            _ => return None,
        };
        self.builder
            .declare_external_vararg(name, sig.params.clone(), sig.ret.clone());
        self.fn_signatures.insert(name.to_string(), sig.clone());
        Some(sig)
    }

    // ============ Functions ============

    fn lower_function(&mut self, func: &ast::Function) {
        let Some(sig) = self.fn_signatures.get(&func.proto.name).cloned() else {
            return;
        };
        let param_vregs =
            self.builder
                .start_function(&func.proto.name, sig.params.clone(), sig.ret.clone());

        // Fresh flat namespace for this function
        self.locals.clear();

        let param_names: Vec<&str> = if func.proto.name == ENTRY_POINT {
            vec!["argc", "argv"]
        } else {
            func.proto.params.iter().map(|p| p.name.as_str()).collect()
        };

        // Parameters arrive as values but are copied into stack slots so
        // they can be reassigned like any local
        for (i, &vreg) in param_vregs.iter().enumerate() {
            let ty = sig.params[i].clone();
            self.vreg_types.insert(vreg, ty.clone());
            let slot = self.builder.alloca(ty.clone());
            self.vreg_types.insert(slot, IrType::ptr(ty));
            self.builder.store(slot, vreg);
            if let Some(name) = param_names.get(i) {
                self.locals.insert((*name).to_string(), slot);
            }
        }

        self.lower_block(&func.body);

        // A void function always gets a closing return; this lands only
        // when the body left the final block unterminated
        if sig.ret == IrType::Void {
            self.builder.ret(None);
        }
    }

    // ============ Statements ============

    fn lower_block(&mut self, block: &ast::Block) {
        for stmt in &block.stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &ast::Stmt) {
        match &stmt.kind {
            StmtKind::Block(inner) => self.lower_block(inner),

            StmtKind::VarDecl { ty, name, init } => {
                // Storage lives in the entry block so the slot exists no
                // matter which nested block declares it
                let elem = ir_type(*ty);
                let slot = self.builder.alloca_at_entry(elem.clone());
                self.vreg_types.insert(slot, IrType::ptr(elem));

                if let Some(init) = init {
                    if let Some(value) = self.lower_expr(init) {
                        self.builder.store(slot, value);
                    }
                }

                // Bind after the initializer: `int x = x;` sees the old x
                self.locals.insert(name.clone(), slot);
            }

            StmtKind::Return(expr) => {
                // A failed operand degrades to a bare return
                let value = self.lower_expr(expr);
                self.builder.ret(value);
            }

            StmtKind::Print { format, args } => {
                let _ = self.lookup_function("printf");
                let fmt_name = self.builder.add_string_constant(format);
                let fmt_ptr = self.builder.global_string_ptr(&fmt_name);
                self.vreg_types.insert(fmt_ptr, IrType::ptr(IrType::I8));

                // Arguments that fail to lower are reported and dropped;
                // the call is emitted with whatever remains. Nothing
                // checks the values against the format string.
                let mut values = vec![fmt_ptr];
                values.extend(args.iter().filter_map(|arg| self.lower_expr(arg)));
                self.builder.call_void("printf", values);
            }

            StmtKind::Scan { target } => {
                let Some(&slot) = self.locals.get(target) else {
                    self.error("unknown variable name in scan");
                    return;
                };
                let _ = self.lookup_function("scanf");
                // Every scan target reads as an integer, whatever its
                // declared type
                let fmt_name = self.builder.add_string_constant("%d");
                let fmt_ptr = self.builder.global_string_ptr(&fmt_name);
                self.vreg_types.insert(fmt_ptr, IrType::ptr(IrType::I8));
                self.builder.call_void("scanf", vec![fmt_ptr, slot]);
            }

            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let Some(cond) = self.lower_expr(condition) else {
                    return;
                };
                let cond = self.coerce_to_bool(cond);

                let then_block = self.builder.create_block();
                let else_block = self.builder.create_block();
                let merge_block = self.builder.create_block();

                self.builder.cond_br(cond, then_block, else_block);

                self.builder.start_block(then_block);
                self.lower_block(then_branch);
                self.builder.br(merge_block);

                // The else block exists even without an else branch
                self.builder.start_block(else_block);
                if let Some(else_branch) = else_branch {
                    self.lower_block(else_branch);
                }
                self.builder.br(merge_block);

                self.builder.start_block(merge_block);
            }

            StmtKind::While { condition, body } => {
                let header_block = self.builder.create_block();
                let body_block = self.builder.create_block();
                let after_block = self.builder.create_block();

                self.builder.br(header_block);

                // The condition re-lowers in the header on every trip
                self.builder.start_block(header_block);
                if let Some(cond) = self.lower_expr(condition) {
                    let cond = self.coerce_to_bool(cond);
                    self.builder.cond_br(cond, body_block, after_block);
                }

                self.builder.start_block(body_block);
                self.lower_block(body);
                self.builder.br(header_block);

                self.builder.start_block(after_block);
            }
        }
    }

    /// Compare a value against zero to use it as a branch condition
    fn coerce_to_bool(&mut self, value: VReg) -> VReg {
        let zero = self.builder.const_bool(false);
        self.vreg_types.insert(zero, IrType::Bool);
        let cond = self.builder.icmp(CmpOp::Ne, value, zero);
        self.vreg_types.insert(cond, IrType::Bool);
        cond
    }

    // ============ Expressions ============

    fn lower_expr(&mut self, expr: &ast::Expr) -> Option<VReg> {
        match &expr.kind {
            ExprKind::Number { text, kind } => self.lower_number(text, *kind),

            ExprKind::Str(value) => {
                let name = self.builder.add_string_constant(value);
                let vreg = self.builder.global_string_ptr(&name);
                self.vreg_types.insert(vreg, IrType::ptr(IrType::I8));
                Some(vreg)
            }

            ExprKind::Bool(value) => {
                let vreg = self.builder.const_bool(*value);
                self.vreg_types.insert(vreg, IrType::Bool);
                Some(vreg)
            }

            ExprKind::Variable(name) => {
                let Some(&slot) = self.locals.get(name) else {
                    return self.error("unknown variable name");
                };
                let vreg = self.builder.load(slot);
                let ty = match self.vreg_types.get(&slot) {
                    Some(IrType::Ptr(inner)) => (**inner).clone(),
                    _ => IrType::Void,
                };
                self.vreg_types.insert(vreg, ty);
                Some(vreg)
            }

            ExprKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs),

            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand),

            ExprKind::Call { callee, args } => self.lower_call(callee, args),
        }
    }

    fn lower_number(&mut self, text: &str, kind: NumberKind) -> Option<VReg> {
        match kind {
            NumberKind::Int => {
                let Ok(value) = text.parse::<i64>() else {
                    return self.error("invalid integer literal");
                };
                // 32-bit two's-complement semantics: wide literals wrap
                let vreg = self.builder.const_int(i64::from(value as i32));
                self.vreg_types.insert(vreg, IrType::I32);
                Some(vreg)
            }
            NumberKind::Float => {
                let Ok(value) = text.parse::<f64>() else {
                    return self.error("invalid float literal");
                };
                let vreg = self.builder.const_float(value);
                self.vreg_types.insert(vreg, IrType::F64);
                Some(vreg)
            }
        }
    }

    fn lower_binary(&mut self, op: BinOp, lhs: &ast::Expr, rhs: &ast::Expr) -> Option<VReg> {
        let l = self.lower_expr(lhs)?;
        let r = self.lower_expr(rhs)?;

        // The instruction family follows the left operand's produced
        // type; nothing checks that the right operand agrees
        let int_family = matches!(
            self.vreg_types.get(&l),
            Some(IrType::Bool | IrType::I8 | IrType::I32)
        );

        let vreg = if int_family {
            match op {
                BinOp::Add => self.builder.add(l, r),
                BinOp::Sub => self.builder.sub(l, r),
                BinOp::Mul => self.builder.mul(l, r),
                BinOp::Lt => self.builder.icmp(CmpOp::Ult, l, r),
                BinOp::LtEq => self.builder.icmp(CmpOp::Ule, l, r),
                BinOp::GtEq => self.builder.icmp(CmpOp::Uge, l, r),
                BinOp::Eq => self.builder.icmp(CmpOp::Eq, l, r),
                BinOp::NotEq => self.builder.icmp(CmpOp::Ne, l, r),
                BinOp::And => self.builder.and(l, r),
                BinOp::Or => self.builder.or(l, r),
            }
        } else {
            match op {
                BinOp::Add => self.builder.fadd(l, r),
                BinOp::Sub => self.builder.fsub(l, r),
                BinOp::Mul => self.builder.fmul(l, r),
                BinOp::Lt => self.builder.fcmp(CmpOp::Ult, l, r),
                BinOp::LtEq => self.builder.fcmp(CmpOp::Ule, l, r),
                BinOp::GtEq => self.builder.fcmp(CmpOp::Uge, l, r),
                BinOp::Eq => self.builder.fcmp(CmpOp::Eq, l, r),
                BinOp::NotEq => self.builder.fcmp(CmpOp::Ne, l, r),
                // No logical ops in the float family
                BinOp::And | BinOp::Or => return self.error("invalid binary operator"),
            }
        };

        let ty = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::And | BinOp::Or => self
                .vreg_types
                .get(&l)
                .cloned()
                .unwrap_or(IrType::I32),
            _ => IrType::Bool,
        };
        self.vreg_types.insert(vreg, ty);
        Some(vreg)
    }

    fn lower_unary(&mut self, op: UnOp, operand: &ast::Expr) -> Option<VReg> {
        let value = self.lower_expr(operand)?;
        match op {
            UnOp::Not => {
                let vreg = self.builder.not(value);
                let ty = self
                    .vreg_types
                    .get(&value)
                    .cloned()
                    .unwrap_or(IrType::Bool);
                self.vreg_types.insert(vreg, ty);
                Some(vreg)
            }
        }
    }

    fn lower_call(&mut self, callee: &str, args: &[ast::Expr]) -> Option<VReg> {
        let Some(sig) = self.lookup_function(callee) else {
            return self.error("unknown function referenced");
        };
        if !sig.is_vararg && sig.params.len() != args.len() {
            return self.error("incorrect number of arguments passed");
        }

        // Arguments lower left to right; the first failure aborts the
        // call with nothing emitted
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.lower_expr(arg)?);
        }

        let vreg = self.builder.call(callee, values);
        self.vreg_types.insert(vreg, sig.ret.clone());
        Some(vreg)
    }
}

/// Map a declared type name to its IR type. `string` falls through to
/// void: only int/float/bool have first-class storage.
fn ir_type(ty: ast::Type) -> IrType {
    match ty {
        ast::Type::Int => IrType::I32,
        ast::Type::Float => IrType::F32,
        ast::Type::Bool => IrType::Bool,
        ast::Type::Str | ast::Type::Void => IrType::Void,
    }
}

/// Print a module in a readable format
pub fn print_module(module: &Module) -> String {
    let mut output = String::new();
    output.push_str(&format!("module {}\n\n", module.name));

    for global in &module.globals {
        let keyword = if global.is_const { "const" } else { "global" };
        output.push_str(&format!("{} @{} : {}", keyword, global.name, global.ty));
        if let Some(ref init) = global.init {
            output.push_str(&format!(" = {}", init));
        }
        output.push('\n');
    }
    if !module.globals.is_empty() {
        output.push('\n');
    }

    for func in &module.functions {
        if func.is_external {
            output.push_str(&format!("declare {} ", func.name));
        } else {
            output.push_str(&format!("define {} ", func.name));
        }

        output.push('(');
        for (i, (vreg, ty)) in func.params.iter().enumerate() {
            if i > 0 {
                output.push_str(", ");
            }
            if func.is_external {
                output.push_str(&format!("{}", ty));
            } else {
                output.push_str(&format!("{} {}", ty, vreg));
            }
        }
        if func.is_vararg {
            if !func.params.is_empty() {
                output.push_str(", ");
            }
            output.push_str("...");
        }
        output.push_str(&format!(") -> {} ", func.ret_type));

        if func.is_external {
            output.push('\n');
            continue;
        }

        output.push_str("{\n");
        for block in &func.blocks {
            output.push_str(&format!("  {}:\n", block.id));
            for instr in &block.instructions {
                output.push_str(&format!("    {}\n", instr));
            }
            if let Some(ref term) = block.terminator {
                output.push_str(&format!("    {}\n", term));
            }
        }
        output.push_str("}\n\n");
    }

    output
}

/// Write the textual form of a module to a file
pub fn write_module(module: &Module, path: &Path) -> io::Result<()> {
    fs::write(path, print_module(module))
}
