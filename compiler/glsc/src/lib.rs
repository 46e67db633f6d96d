//! Build driver for the glsc shader compiler.
//!
//! One `BuildContext` spans every unit of a build: the shared rename table
//! keeps varyings and include counters consistent across files, and the
//! dead-code and contract ledgers defer their verdicts until every file has
//! been seen. Per unit, the pipeline is collect, validate, optionally
//! optimize and obfuscate, then regenerate the source text.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gls_analyze::{ContractLedger, DeadCodeLedger};
use gls_ast::{NodeIndex, SyntaxTree, UnitMetadata};
use gls_collect::CollectError;
use gls_diagnostic::{Diagnostic, DiagnosticQueue, ErrorCode};
use gls_obfuscate::{ObfuscateError, RenameMap, SharedNameTable};
use gls_opt::OptError;

/// One shader file ready for the pipeline: its parsed tree plus the side
/// tables the parser split out of the raw text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub file: String,
    pub tree: SyntaxTree,
    #[serde(default)]
    pub metadata: UnitMetadata,
}

/// Which optional passes a build runs. Analysis always runs.
#[derive(Copy, Clone, Debug, Default)]
pub struct BuildOptions {
    pub optimize: bool,
    pub obfuscate: bool,
}

/// State shared across every unit of one build.
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    pub options: BuildOptions,
    pub shared: SharedNameTable,
    pub dead: DeadCodeLedger,
    pub contracts: ContractLedger,
    pub queue: DiagnosticQueue,
}

impl BuildContext {
    pub fn new(options: BuildOptions) -> Self {
        BuildContext {
            options,
            ..BuildContext::default()
        }
    }
}

/// Hard failures that abort a unit's pipeline. Soft diagnostics go through
/// the queue instead and are reported once the build completes.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Opt(#[from] OptError),
    #[error(transparent)]
    Obfuscate(#[from] ObfuscateError),
}

impl BuildError {
    /// The queued form of this failure, attributed to `file`. Every abort
    /// shows up in the final report with a code, same as soft diagnostics.
    pub fn diagnostic(&self, file: &str) -> Diagnostic {
        match self {
            BuildError::Collect(CollectError::ReservedDeclaration { name }) => {
                gls_diagnostic::reserved_declaration(file, name)
            }
            BuildError::Collect(CollectError::Marker(_)) => Diagnostic::error(ErrorCode::E0002)
                .with_message(self.to_string())
                .with_file(file),
            BuildError::Obfuscate(ObfuscateError::QualifierCollision { .. }) => {
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(self.to_string())
                    .with_file(file)
            }
            // Stale indexes and missing uids are internal invariant breaks.
            BuildError::Collect(_) | BuildError::Opt(_) | BuildError::Obfuscate(_) => {
                Diagnostic::error(ErrorCode::E9001)
                    .with_message(self.to_string())
                    .with_file(file)
            }
        }
    }
}

/// Run the full pipeline for one unit and return the regenerated source.
///
/// Units must be compiled in a stable order: shared-name allocation in the
/// context is order dependent.
pub fn compile_unit(
    unit: &mut CompilationUnit,
    ctx: &mut BuildContext,
) -> Result<String, BuildError> {
    info!(file = %unit.file, "compiling");
    match run_pipeline(unit, ctx) {
        Ok(source) => Ok(source),
        Err(error) => {
            ctx.queue.push(error.diagnostic(&unit.file));
            Err(error)
        }
    }
}

fn run_pipeline(unit: &mut CompilationUnit, ctx: &mut BuildContext) -> Result<String, BuildError> {
    let mut index = NodeIndex::recompute(&mut unit.tree);
    let mut seq = gls_collect::collect(&unit.tree, &index, &unit.metadata)?;

    gls_analyze::validate(
        &unit.file,
        &unit.tree,
        &index,
        &seq,
        &unit.metadata,
        &mut ctx.dead,
        &mut ctx.contracts,
        &mut ctx.queue,
    );

    if ctx.options.optimize {
        let elided = gls_opt::mark_eliminable_braces(&mut unit.tree);
        let folded = gls_opt::reuse_slots(&mut unit.tree, &index, &seq)?;
        debug!(elided, folded, "optimized");
        // Slot folding restructures declarations; later passes need a
        // fresh index and sequence.
        if !index.is_current(&unit.tree) {
            index = NodeIndex::recompute(&mut unit.tree);
            seq = gls_collect::collect(&unit.tree, &index, &unit.metadata)?;
        }
    }

    if ctx.options.obfuscate {
        let renames =
            gls_obfuscate::obfuscate(&mut unit.tree, &index, &seq, &mut ctx.shared, &unit.metadata)?;
        patch_graph_conditions(&mut unit.metadata, &renames);
    }

    Ok(gls_emit::translate(&unit.tree, &unit.metadata))
}

/// Drain the build-wide ledgers into the queue and hand it back. Call once,
/// after the last unit; only then are the dead-code and contract verdicts
/// final.
pub fn finish(ctx: BuildContext) -> DiagnosticQueue {
    let BuildContext {
        dead,
        contracts,
        mut queue,
        ..
    } = ctx;
    queue.extend(dead.finish());
    queue.extend(contracts.finish());
    queue
}

/// Graph-node conditions are stored as plain text, so after renaming they
/// get a word-level rewrite instead of the tree pass everything else gets.
fn patch_graph_conditions(metadata: &mut UnitMetadata, renames: &RenameMap) {
    if renames.is_empty() {
        return;
    }
    for node in &mut metadata.graph_nodes {
        for condition in &mut node.conditions {
            *condition = patch_condition_text(condition, renames);
        }
    }
}

fn patch_condition_text(condition: &str, renames: &RenameMap) -> String {
    let mut out = String::with_capacity(condition.len());
    let mut token = String::new();
    for ch in condition.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            token.push(ch);
        } else {
            flush_token(&mut out, &mut token, renames);
            out.push(ch);
        }
    }
    flush_token(&mut out, &mut token, renames);
    out
}

fn flush_token(out: &mut String, token: &mut String, renames: &RenameMap) {
    if token.is_empty() {
        return;
    }
    // Number fragments ("0", "5" around a decimal point) are never names.
    let numeric = token.starts_with(|c: char| c.is_ascii_digit());
    match renames.get(token.as_str()) {
        Some(renamed) if !numeric => out.push_str(renamed),
        _ => out.push_str(token),
    }
    token.clear();
}
