//! Identifier renaming for the glsc shader compiler.
//!
//! Shrinks every renameable identifier to the shortest available name from
//! a bijective base-53 counter. Host-visible names survive: uniforms and
//! attributes keep their spelling, varyings rename consistently across the
//! files of one build through the shared table, and include bodies replay
//! their first file's counter range so the same include text never diverges
//! between shaders.

use thiserror::Error;

mod automaton;
mod generate;
mod rename;
mod shared;

pub use automaton::{adjudicate, Fate};
pub use generate::NameGenerator;
pub use rename::{obfuscate, RenameMap};
pub use shared::SharedNameTable;

/// Renaming failure modes.
#[derive(Error, Debug)]
pub enum ObfuscateError {
    /// One name carries storage qualifiers that cannot coexist.
    #[error("contradictory storage qualifiers for `{name}`")]
    QualifierCollision { name: String },
    /// The node index does not match the tree's current epoch.
    #[error("node index is stale, recompute before renaming")]
    StaleIndex,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use gls_ast::{build, reserved, NodeIndex, NodeKind, Qualifier, SyntaxTree, UnitMetadata};
    use gls_collect::{collect, MainSequence};
    use pretty_assertions::assert_eq;

    fn collect_fresh(tree: &mut SyntaxTree) -> (NodeIndex, MainSequence) {
        let index = NodeIndex::recompute(tree);
        let seq = collect(tree, &index, &UnitMetadata::default()).unwrap();
        (index, seq)
    }

    /// A shader with `varying vec3 v_normal;` read inside `main`.
    fn shader_with_varying() -> SyntaxTree {
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let d = build::declarator(&mut tree, "v_normal", None);
        let varying = build::decl(&mut tree, Qualifier::Varying, "vec3", vec![d]);
        let usage = build::ident(&mut tree, "v_normal");
        let arg = build::call(&mut tree, "normalize", vec![usage]);
        let stmt = build::expr_stmt(&mut tree, arg);
        let main = build::function(&mut tree, "void", "main", vec![], vec![stmt]);
        tree.push_child(root, varying);
        tree.push_child(root, main);
        tree
    }

    fn declarator_text(tree: &SyntaxTree, original_missing: &str) -> String {
        // The single module-level declarator after renaming.
        tree.iter()
            .find(|(_, n)| n.kind == NodeKind::Declarator)
            .map(|(_, n)| n.text().to_owned())
            .filter(|t| t != original_missing)
            .unwrap()
    }

    #[test]
    fn varyings_rename_identically_across_files() {
        let mut shared = SharedNameTable::default();
        let metadata = UnitMetadata::default();

        let mut vertex = shader_with_varying();
        let (index, seq) = collect_fresh(&mut vertex);
        let map_v = obfuscate(&mut vertex, &index, &seq, &mut shared, &metadata).unwrap();

        let mut fragment = shader_with_varying();
        let (index, seq) = collect_fresh(&mut fragment);
        let map_f = obfuscate(&mut fragment, &index, &seq, &mut shared, &metadata).unwrap();

        assert_eq!(map_v.get("v_normal"), map_f.get("v_normal"));
        assert_eq!(
            declarator_text(&vertex, "v_normal"),
            declarator_text(&fragment, "v_normal")
        );
    }

    #[test]
    fn module_locals_before_a_shared_varying_avoid_its_name() {
        // The vertex file gives the varying its name. The fragment file
        // declares a plain module variable first; it must not mint the
        // name the varying will reuse further down.
        let mut shared = SharedNameTable::default();
        let metadata = UnitMetadata::default();

        let mut vertex = shader_with_varying();
        let (index, seq) = collect_fresh(&mut vertex);
        let map_v = obfuscate(&mut vertex, &index, &seq, &mut shared, &metadata).unwrap();
        let varying_name = map_v.get("v_normal").unwrap().clone();

        let mut fragment = SyntaxTree::new(NodeKind::Root);
        let root = fragment.root();
        let init = build::literal(&mut fragment, "1.0");
        let brightness = build::var(&mut fragment, "float", "brightness", Some(init));
        let d = build::declarator(&mut fragment, "v_normal", None);
        let varying = build::decl(&mut fragment, Qualifier::Varying, "vec3", vec![d]);
        let b = build::ident(&mut fragment, "brightness");
        let n = build::ident(&mut fragment, "v_normal");
        let product = build::binary(&mut fragment, "*", b, n);
        let stmt = build::expr_stmt(&mut fragment, product);
        let main = build::function(&mut fragment, "void", "main", vec![], vec![stmt]);
        fragment.push_child(root, brightness);
        fragment.push_child(root, varying);
        fragment.push_child(root, main);

        let (index, seq) = collect_fresh(&mut fragment);
        let map_f = obfuscate(&mut fragment, &index, &seq, &mut shared, &metadata).unwrap();

        assert_eq!(map_f.get("v_normal"), Some(&varying_name));
        assert_ne!(
            map_f.get("brightness"),
            Some(&varying_name),
            "module variable took the varying's recorded name"
        );
    }

    #[test]
    fn uniforms_keep_their_names() {
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let d = build::declarator(&mut tree, "u_model", None);
        let uniform = build::decl(&mut tree, Qualifier::Uniform, "mat4", vec![d]);
        let usage = build::ident(&mut tree, "u_model");
        let stmt = build::expr_stmt(&mut tree, usage);
        let main = build::function(&mut tree, "void", "main", vec![], vec![stmt]);
        tree.push_child(root, uniform);
        tree.push_child(root, main);

        let (index, seq) = collect_fresh(&mut tree);
        let mut shared = SharedNameTable::default();
        let map = obfuscate(&mut tree, &index, &seq, &mut shared, &UnitMetadata::default()).unwrap();

        assert!(map.get("u_model").is_none());
        assert_eq!(tree.node(d).text(), "u_model");
        assert!(tree
            .iter()
            .any(|(_, n)| n.kind == NodeKind::Ident && n.text() == "u_model"));
    }

    #[test]
    fn contradictory_qualifiers_fail() {
        // uniform float shade; varying float shade;  (preprocessor residue)
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let d1 = build::declarator(&mut tree, "shade", None);
        let first = build::decl(&mut tree, Qualifier::Uniform, "float", vec![d1]);
        let d2 = build::declarator(&mut tree, "shade", None);
        let second = build::decl(&mut tree, Qualifier::Varying, "float", vec![d2]);
        tree.push_child(root, first);
        tree.push_child(root, second);

        let (index, seq) = collect_fresh(&mut tree);
        let mut shared = SharedNameTable::default();
        let result = obfuscate(&mut tree, &index, &seq, &mut shared, &UnitMetadata::default());
        assert!(matches!(
            result,
            Err(ObfuscateError::QualifierCollision { name }) if name == "shade"
        ));
    }

    #[test]
    fn include_bodies_replay_their_counter_range() {
        // File two declares an extra module variable before splicing the
        // same include; the include's declarator must still get the name
        // file one assigned it.
        fn with_include(extra_before: bool) -> SyntaxTree {
            let mut tree = SyntaxTree::new(NodeKind::Root);
            let root = tree.root();
            if extra_before {
                let init = build::literal(&mut tree, "1.0");
                let extra = build::var(&mut tree, "float", "extra", Some(init));
                let use_extra = build::ident(&mut tree, "extra");
                let stmt = build::expr_stmt(&mut tree, use_extra);
                tree.push_child(root, extra);
                tree.push_child(root, stmt);
            }
            let init = build::literal(&mut tree, "0.5");
            let shared_decl = build::var(&mut tree, "float", "ambient", Some(init));
            build::with_comment(&mut tree, shared_decl, "@include-begin common.glsl");
            let usage = build::ident(&mut tree, "ambient");
            let stmt = build::expr_stmt(&mut tree, usage);
            build::with_comment(&mut tree, stmt, "@include-end common.glsl");
            tree.push_child(root, shared_decl);
            tree.push_child(root, stmt);
            tree
        }

        fn ambient_rename(tree: &SyntaxTree) -> String {
            tree.iter()
                .filter(|(_, n)| n.kind == NodeKind::Declarator)
                .map(|(_, n)| n.text().to_owned())
                .last()
                .unwrap()
        }

        let mut shared = SharedNameTable::default();
        let metadata = UnitMetadata::default();

        let mut first = with_include(false);
        let (index, seq) = collect_fresh(&mut first);
        obfuscate(&mut first, &index, &seq, &mut shared, &metadata).unwrap();
        let in_first = ambient_rename(&first);

        let mut second = with_include(true);
        let (index, seq) = collect_fresh(&mut second);
        obfuscate(&mut second, &index, &seq, &mut shared, &metadata).unwrap();
        let in_second = ambient_rename(&second);

        assert_eq!(in_first, in_second, "include rename must not drift");

        // The extra module variable must not have taken a name from the
        // include's claimed range.
        let extra_rename = second
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Declarator)
            .map(|(_, n)| n.text().to_owned())
            .next()
            .unwrap();
        assert_ne!(extra_rename, in_second);
    }

    #[test]
    fn struct_fields_and_accesses_rename_together() {
        // struct Light { float intensity; }; Light light; g(light.intensity);
        // float intensity = 2.0;  -- the global must keep a distinct name.
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let light_struct = build::struct_def(&mut tree, "Light", &[("float", "intensity")]);
        let d = build::declarator(&mut tree, "light", None);
        let light_var = build::decl(&mut tree, Qualifier::None, "Light", vec![d]);
        let init = build::literal(&mut tree, "2.0");
        let global = build::var(&mut tree, "float", "intensity", Some(init));

        let recv = build::ident(&mut tree, "light");
        let access = build::field(&mut tree, recv, "intensity");
        let g = build::call(&mut tree, "g", vec![access]);
        let s1 = build::expr_stmt(&mut tree, g);
        let use_global = build::ident(&mut tree, "intensity");
        let s2 = build::expr_stmt(&mut tree, use_global);
        let main = build::function(&mut tree, "void", "main", vec![], vec![s1, s2]);

        tree.push_child(root, light_struct);
        tree.push_child(root, light_var);
        tree.push_child(root, global);
        tree.push_child(root, main);

        let (index, seq) = collect_fresh(&mut tree);
        let mut shared = SharedNameTable::default();
        obfuscate(&mut tree, &index, &seq, &mut shared, &UnitMetadata::default()).unwrap();

        let field_text = tree
            .iter()
            .find(|(_, n)| n.kind == NodeKind::StructField)
            .map(|(_, n)| n.text().to_owned())
            .unwrap();
        let access_text = tree
            .iter()
            .find(|(_, n)| n.kind == NodeKind::FieldSelect)
            .map(|(_, n)| n.text().to_owned())
            .unwrap();
        assert_eq!(field_text, access_text, "access follows the member rename");

        // The global `intensity` was renamed independently of the field;
        // nothing reachable still spells the original name.
        assert!(!tree
            .iter()
            .any(|(_, n)| matches!(n.kind, NodeKind::Ident | NodeKind::Declarator)
                && n.text() == "intensity"));
    }

    #[test]
    fn renamed_identifiers_never_collide_or_shadow_reserved() {
        let mut tree = SyntaxTree::new(NodeKind::Root);
        let root = tree.root();
        let mut stmts = Vec::new();
        for i in 0..120 {
            let name = format!("local_{i}");
            let init = build::literal(&mut tree, "0.0");
            let v = build::var(&mut tree, "float", &name, Some(init));
            let u = build::ident(&mut tree, &name);
            let s = build::expr_stmt(&mut tree, u);
            stmts.push(v);
            stmts.push(s);
        }
        let main = build::function(&mut tree, "void", "main", vec![], stmts);
        tree.push_child(root, main);

        let (index, seq) = collect_fresh(&mut tree);
        let mut shared = SharedNameTable::default();
        obfuscate(&mut tree, &index, &seq, &mut shared, &UnitMetadata::default()).unwrap();

        let names: Vec<String> = tree
            .iter()
            .filter(|(_, n)| n.kind == NodeKind::Declarator)
            .map(|(_, n)| n.text().to_owned())
            .collect();
        assert_eq!(names.len(), 120);
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), 120, "all short names distinct");
        assert!(names.iter().all(|n| !reserved::is_reserved(n)));
        assert!(names.iter().all(|n| n != "main"));
    }
}
