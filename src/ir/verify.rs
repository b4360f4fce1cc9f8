//! IR Structural Verification
//!
//! Checks that a lowered function's control-flow graph is well-formed:
//! it has blocks, every block ends in a terminator, and every branch
//! targets a block that exists. Lowering can leave a function broken
//! (a failed condition, a missing return on some path); this is where
//! that damage surfaces.

use std::collections::HashSet;

use super::instr::Terminator;
use super::types::{BlockId, Function, Module};
use thiserror::Error;

/// Structural verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("function '{function}' has no basic blocks")]
    EmptyBody { function: String },

    #[error("function '{function}': block {block} has no terminator")]
    MissingTerminator { function: String, block: BlockId },

    #[error("function '{function}': branch to undefined block {block}")]
    UnknownBlock { function: String, block: BlockId },
}

/// Verify a single function. External declarations always pass.
pub fn verify_function(func: &Function) -> Result<(), VerifyError> {
    if func.is_external {
        return Ok(());
    }

    if func.blocks.is_empty() {
        return Err(VerifyError::EmptyBody {
            function: func.name.clone(),
        });
    }

    let known: HashSet<BlockId> = func.blocks.iter().map(|b| b.id).collect();

    for block in &func.blocks {
        let Some(ref term) = block.terminator else {
            return Err(VerifyError::MissingTerminator {
                function: func.name.clone(),
                block: block.id,
            });
        };

        let targets: Vec<BlockId> = match term {
            Terminator::Ret(_) => Vec::new(),
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
        };
        for target in targets {
            if !known.contains(&target) {
                return Err(VerifyError::UnknownBlock {
                    function: func.name.clone(),
                    block: target,
                });
            }
        }
    }

    Ok(())
}

/// Verify every function in a module, collecting all failures
pub fn verify_module(module: &Module) -> Vec<VerifyError> {
    module
        .functions
        .iter()
        .filter_map(|f| verify_function(f).err())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Lowerer;

    fn lower_source(source: &str) -> Module {
        let (module, errors) = crate::parser::parse(source);
        assert!(errors.is_empty(), "parse errors: {:?}", errors);
        Lowerer::new("test").lower_module(&module)
    }

    #[test]
    fn test_well_formed_module_passes() {
        let module = lower_source(
            "fn add(int a, int b): int { return a + b; }\n\
             fn main(): int { if (true) { return add(1, 2); } return 0; }",
        );
        assert!(verify_module(&module).is_empty());
    }

    #[test]
    fn test_loop_passes() {
        let module = lower_source("fn main(): int { while (true) { print(\"x\"); } return 0; }");
        assert!(verify_module(&module).is_empty());
    }

    #[test]
    fn test_failed_while_condition_leaves_header_unterminated() {
        // `y` is never declared, so the header's compare-and-branch is
        // never emitted and verification flags the block.
        let module = lower_source("fn main(): int { while (y) { print(\"x\"); } return 0; }");
        let errors = verify_module(&module);
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::MissingTerminator { function, .. } if function == "main")));
    }

    #[test]
    fn test_missing_return_in_nonvoid_function() {
        // Non-void functions rely on the body supplying a return; when
        // it does not, the last block has no terminator.
        let module = lower_source("fn f(int a): int { print(\"%d\", a); }");
        let errors = verify_module(&module);
        assert_eq!(
            errors,
            vec![VerifyError::MissingTerminator {
                function: "f".to_string(),
                block: crate::ir::BlockId(0),
            }]
        );
    }

    #[test]
    fn test_external_declarations_pass() {
        let module = lower_source("fn go() { print(\"hi\"); }");
        assert!(verify_module(&module).is_empty());
    }
}
