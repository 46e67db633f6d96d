//! Statement-level source regeneration.
//!
//! One recursive descent over the tree mirrors the grammar productions.
//! Offset-indexed side tables (preprocessor directives, extension lines)
//! are merged back in: before an offset-bearing node is emitted, every
//! pending entry whose offset falls in the gap since the last one is
//! flushed in offset order.

use gls_ast::{NodeId, NodeKind, SyntaxTree, UnitMetadata};

use crate::expr::expr;

pub struct Emitter<'a> {
    tree: &'a SyntaxTree,
    metadata: &'a UnitMetadata,
    out: String,
    indent: usize,
    cursor: u32,
}

impl<'a> Emitter<'a> {
    pub fn new(tree: &'a SyntaxTree, metadata: &'a UnitMetadata) -> Self {
        Emitter {
            tree,
            metadata,
            out: String::new(),
            indent: 0,
            cursor: 0,
        }
    }

    /// Emit the whole translation unit and return the text.
    pub fn run(mut self) -> String {
        let children = self.tree.node(self.tree.root()).children.clone();
        for child in children {
            self.statement(child);
        }
        self.flush_to(u32::MAX);
        self.out
    }

    fn pad(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
    }

    fn line(&mut self, text: &str) {
        self.pad();
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Flush side-table entries with offsets in `[cursor, offset)`.
    fn flush_to(&mut self, offset: u32) {
        if offset <= self.cursor {
            return;
        }
        let mut entries: Vec<(u32, String)> = self
            .metadata
            .directives_in(self.cursor..offset)
            .map(|(at, text)| (at, text.to_owned()))
            .collect();
        for (&at, ext) in self.metadata.extensions.range(self.cursor..offset) {
            entries.push((at, format!("#extension {} : {}", ext.name, ext.behavior)));
        }
        entries.sort_by_key(|&(at, _)| at);
        for (_, text) in entries {
            self.line(&text);
        }
        self.cursor = offset;
    }

    pub fn statement(&mut self, id: NodeId) {
        let tree = self.tree;
        let node = tree.node(id);
        if let Some(offset) = node.offset {
            self.flush_to(offset);
        }
        for comment in node.comments.clone() {
            self.line(&format!("// {comment}"));
        }
        let children = node.children.clone();
        match node.kind {
            NodeKind::FunctionDef => self.function_def(id),
            NodeKind::FunctionProto => {
                let sig = self.signature(id, &children);
                self.line(&format!("{sig};"));
            }
            NodeKind::DeclarationList => {
                let text = declaration_text(tree, id);
                self.line(&format!("{text};"));
            }
            NodeKind::StructDef => {
                self.line(&format!("struct {} {{", node.text()));
                self.indent += 1;
                for &field in &children {
                    let f = tree.node(field);
                    let mut text = format!("{} {}", f.type_name(), f.text());
                    if let Some(size) = &f.array_size {
                        text.push_str(&format!("[{size}]"));
                    }
                    self.line(&format!("{text};"));
                }
                self.indent -= 1;
                self.line("};");
            }
            NodeKind::Block => {
                if node.brace_eliminable && children.len() == 1 {
                    self.statement(children[0]);
                } else {
                    self.line("{");
                    self.indent += 1;
                    for child in children {
                        self.statement(child);
                    }
                    self.indent -= 1;
                    self.line("}");
                }
            }
            NodeKind::If => self.if_statement(&children),
            NodeKind::For => {
                let init = inline_statement(tree, children[0]);
                let cond = expr(tree, children[1]);
                let step = expr(tree, children[2]);
                self.pad();
                self.out.push_str(&format!("for ({init}; {cond}; {step})"));
                if self.attached_body(children[3]) {
                    self.out.push('\n');
                }
            }
            NodeKind::While => {
                let cond = expr(tree, children[0]);
                self.pad();
                self.out.push_str(&format!("while ({cond})"));
                if self.attached_body(children[1]) {
                    self.out.push('\n');
                }
            }
            NodeKind::Return => match children.first() {
                Some(&value) => {
                    let text = expr(tree, value);
                    self.line(&format!("return {text};"));
                }
                None => self.line("return;"),
            },
            NodeKind::Break => self.line("break;"),
            NodeKind::Continue => self.line("continue;"),
            NodeKind::Discard => self.line("discard;"),
            NodeKind::ExprStatement => {
                let text = children
                    .first()
                    .map(|&c| expr(tree, c))
                    .unwrap_or_default();
                self.line(&format!("{text};"));
            }
            NodeKind::InvariantDecl => self.line(&format!("invariant {};", node.text())),
            NodeKind::PrecisionDecl | NodeKind::Raw => {
                let mut text = node.text().to_owned();
                if node.kind == NodeKind::PrecisionDecl && !text.ends_with(';') {
                    text.push(';');
                }
                self.line(&text);
            }
            _ => {
                let text = expr(tree, id);
                self.line(&format!("{text};"));
            }
        }
    }

    fn function_def(&mut self, id: NodeId) {
        let children = self.tree.node(id).children.clone();
        let Some((&body, params)) = children.split_last() else {
            return;
        };
        let sig = self.signature(id, params);
        self.pad();
        self.out.push_str(&format!("{sig} {{\n"));
        self.indent += 1;
        let stmts = self.tree.node(body).children.clone();
        for stmt in stmts {
            self.statement(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn signature(&self, id: NodeId, params: &[NodeId]) -> String {
        let tree = self.tree;
        let node = tree.node(id);
        let rendered: Vec<String> = params
            .iter()
            .map(|&p| {
                let param = tree.node(p);
                let qualifier = param.qualifier.keyword();
                if qualifier.is_empty() {
                    format!("{} {}", param.type_name(), param.text())
                } else {
                    format!("{qualifier} {} {}", param.type_name(), param.text())
                }
            })
            .collect();
        format!(
            "{} {}({})",
            node.type_name(),
            node.text(),
            rendered.join(", ")
        )
    }

    fn if_statement(&mut self, children: &[NodeId]) {
        let cond = expr(self.tree, children[0]);
        self.pad();
        self.out.push_str(&format!("if ({cond})"));
        let braced = self.attached_body(children[1]);
        match children.get(2) {
            Some(&alternate) => {
                if braced {
                    self.out.push_str(" else");
                } else {
                    self.pad();
                    self.out.push_str("else");
                }
                if self.attached_body(alternate) {
                    self.out.push('\n');
                }
            }
            None => {
                if braced {
                    self.out.push('\n');
                }
            }
        }
    }

    /// Emit a control-statement body after its header (header has no
    /// trailing newline yet). Returns whether the body closed with `}`.
    fn attached_body(&mut self, id: NodeId) -> bool {
        let node = self.tree.node(id);
        let is_block = node.kind == NodeKind::Block;
        let eliminable = node.brace_eliminable;
        let children = node.children.clone();
        if is_block && !eliminable {
            self.out.push_str(" {\n");
            self.indent += 1;
            for child in children {
                self.statement(child);
            }
            self.indent -= 1;
            self.pad();
            self.out.push('}');
            true
        } else {
            self.out.push('\n');
            self.indent += 1;
            if is_block {
                for child in children {
                    self.statement(child);
                }
            } else {
                self.statement(id);
            }
            self.indent -= 1;
            false
        }
    }
}

/// Declaration text without the trailing semicolon.
pub fn declaration_text(tree: &SyntaxTree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    let qualifier = node.qualifier.keyword();
    if !qualifier.is_empty() {
        out.push_str(qualifier);
        out.push(' ');
    }
    out.push_str(node.type_name());
    out.push(' ');
    let declarators: Vec<String> = node
        .children
        .iter()
        .map(|&d| declarator_text(tree, d))
        .collect();
    out.push_str(&declarators.join(", "));
    out
}

fn declarator_text(tree: &SyntaxTree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut out = node.text().to_owned();
    if let Some(size) = &node.array_size {
        out.push_str(&format!("[{size}]"));
    }
    if let Some(&init) = node.children.first() {
        out.push_str(&format!(" = {}", expr(tree, init)));
    }
    out
}

/// A statement rendered inline, for `for` headers.
fn inline_statement(tree: &SyntaxTree, id: NodeId) -> String {
    let node = tree.node(id);
    match node.kind {
        NodeKind::DeclarationList => declaration_text(tree, id),
        NodeKind::ExprStatement => node
            .children
            .first()
            .map(|&c| expr(tree, c))
            .unwrap_or_default(),
        _ => expr(tree, id),
    }
}
