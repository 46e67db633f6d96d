//! End-to-end scenarios driven through the public build API, the way the
//! CLI drives it: one context, units in order, `finish` at the end.

#![allow(clippy::unwrap_used)]

use glsc::{compile_unit, finish, BuildContext, BuildOptions, CompilationUnit};

use gls_ast::{build, NodeKind, Qualifier, SyntaxTree, UnitMetadata};
use pretty_assertions::assert_eq;

fn unit(file: &str, tree: SyntaxTree) -> CompilationUnit {
    CompilationUnit {
        file: file.into(),
        tree,
        metadata: UnitMetadata::default(),
    }
}

/// helper is only called by unused, unused is never called: both are dead,
/// and neither verdict is known until the ledgers are drained.
#[test]
fn dead_helpers_are_reported_after_the_build() {
    let mut tree = SyntaxTree::new(NodeKind::Root);
    let root = tree.root();

    let one = build::literal(&mut tree, "1.0");
    let r1 = build::ret(&mut tree, Some(one));
    let helper = build::function(&mut tree, "float", "helper", vec![], vec![r1]);

    let call = build::call(&mut tree, "helper", vec![]);
    let r2 = build::ret(&mut tree, Some(call));
    let unused = build::function(&mut tree, "float", "unused", vec![], vec![r2]);

    let main = build::function(&mut tree, "void", "main", vec![], vec![]);

    tree.push_child(root, helper);
    tree.push_child(root, unused);
    tree.push_child(root, main);

    let mut unit = unit("shader.glsl", tree);
    let mut ctx = BuildContext::default();
    let out = compile_unit(&mut unit, &mut ctx).unwrap();
    assert!(out.contains("float helper()"), "analysis must not edit the tree");

    let queue = finish(ctx);
    assert!(!queue.has_errors(), "dead code is a warning, not an error");
    let mut messages: Vec<&str> = queue.iter().map(|d| d.message.as_str()).collect();
    messages.sort_unstable();
    assert_eq!(
        messages,
        vec![
            "function `helper` is never called",
            "function `unused` is never called",
        ]
    );
}

/// Locals of disjoint if/else branches collapse onto one hoisted slot.
#[test]
fn optimized_branch_locals_share_one_hoisted_slot() {
    let mut tree = SyntaxTree::new(NodeKind::Root);
    let root = tree.root();

    let d = build::declarator(&mut tree, "threshold", None);
    let uniform = build::decl(&mut tree, Qualifier::Uniform, "float", vec![d]);

    let t = build::ident(&mut tree, "threshold");
    let half = build::literal(&mut tree, "0.5");
    let cond = build::binary(&mut tree, ">", t, half);

    let branch_block = |tree: &mut SyntaxTree, name: &str, factor: &str| {
        let t = build::ident(tree, "threshold");
        let k = build::literal(tree, factor);
        let init = build::binary(tree, "*", t, k);
        let local = build::var(tree, "float", name, Some(init));
        let usage = build::ident(tree, name);
        let color = build::call(tree, "vec4", vec![usage]);
        let target = build::ident(tree, "gl_FragColor");
        let set = build::assign(tree, "=", target, color);
        let stmt = build::expr_stmt(tree, set);
        build::block(tree, vec![local, stmt])
    };
    let then_b = branch_block(&mut tree, "hot", "2.0");
    let else_b = branch_block(&mut tree, "cold", "0.5");

    let branch = build::if_stmt(&mut tree, cond, then_b, Some(else_b));
    let main = build::function(&mut tree, "void", "main", vec![], vec![branch]);
    tree.push_child(root, uniform);
    tree.push_child(root, main);

    let mut unit = unit("fragment.glsl", tree);
    let mut ctx = BuildContext::new(BuildOptions {
        optimize: true,
        obfuscate: false,
    });
    let out = compile_unit(&mut unit, &mut ctx).unwrap();

    assert_eq!(
        out,
        "uniform float threshold;\n\
         void main() {\n    \
             float _float_tmp0;\n    \
             if (threshold > 0.5) {\n        \
                 _float_tmp0 = threshold * 2.0;\n        \
                 gl_FragColor = vec4(_float_tmp0);\n    \
             } else {\n        \
                 _float_tmp0 = threshold * 0.5;\n        \
                 gl_FragColor = vec4(_float_tmp0);\n    \
             }\n\
         }\n"
    );
    assert!(!finish(ctx).has_errors());
}

/// vertex and fragment declare the same varying; compiled through one
/// context it renames identically in both, while uniforms keep their names.
#[test]
fn shared_varyings_rename_identically_across_units() {
    let mut vertex = SyntaxTree::new(NodeKind::Root);
    {
        let root = vertex.root();
        let d = build::declarator(&mut vertex, "v_normal", None);
        let varying = build::decl(&mut vertex, Qualifier::Varying, "vec3", vec![d]);
        let target = build::ident(&mut vertex, "v_normal");
        let one = build::literal(&mut vertex, "1.0");
        let value = build::call(&mut vertex, "vec3", vec![one]);
        let set = build::assign(&mut vertex, "=", target, value);
        let stmt = build::expr_stmt(&mut vertex, set);
        let main = build::function(&mut vertex, "void", "main", vec![], vec![stmt]);
        vertex.push_child(root, varying);
        vertex.push_child(root, main);
    }

    let mut fragment = SyntaxTree::new(NodeKind::Root);
    {
        let root = fragment.root();
        let d = build::declarator(&mut fragment, "v_normal", None);
        let varying = build::decl(&mut fragment, Qualifier::Varying, "vec3", vec![d]);
        let d = build::declarator(&mut fragment, "u_light", None);
        let uniform = build::decl(&mut fragment, Qualifier::Uniform, "vec3", vec![d]);
        let n = build::ident(&mut fragment, "v_normal");
        let l = build::ident(&mut fragment, "u_light");
        let d = build::call(&mut fragment, "dot", vec![n, l]);
        let color = build::call(&mut fragment, "vec4", vec![d]);
        let target = build::ident(&mut fragment, "gl_FragColor");
        let set = build::assign(&mut fragment, "=", target, color);
        let stmt = build::expr_stmt(&mut fragment, set);
        let main = build::function(&mut fragment, "void", "main", vec![], vec![stmt]);
        fragment.push_child(root, varying);
        fragment.push_child(root, uniform);
        fragment.push_child(root, main);
    }

    let mut ctx = BuildContext::new(BuildOptions {
        optimize: false,
        obfuscate: true,
    });
    let mut vertex = unit("vertex.glsl", vertex);
    let mut fragment = unit("fragment.glsl", fragment);
    let vertex_out = compile_unit(&mut vertex, &mut ctx).unwrap();
    let fragment_out = compile_unit(&mut fragment, &mut ctx).unwrap();

    let varying_name = |out: &str| -> String {
        out.lines()
            .find_map(|l| l.strip_prefix("varying vec3 "))
            .unwrap()
            .trim_end_matches(';')
            .to_owned()
    };
    let in_vertex = varying_name(&vertex_out);
    let in_fragment = varying_name(&fragment_out);
    assert_eq!(in_vertex, in_fragment);
    assert_ne!(in_vertex, "v_normal");

    assert!(fragment_out.contains("uniform vec3 u_light;"));
    assert!(fragment_out.contains("dot("));
    assert!(!fragment_out.contains("v_normal"));
}

/// A field access renames with its struct's member, not with the global
/// that happens to share the member's name.
#[test]
fn field_accesses_follow_their_struct_not_the_global() {
    let mut tree = SyntaxTree::new(NodeKind::Root);
    let root = tree.root();

    let light_struct = build::struct_def(&mut tree, "Light", &[("float", "intensity")]);
    let global = build::var(&mut tree, "float", "intensity", None);

    let lamp = build::var(&mut tree, "Light", "lamp", None);
    let receiver = build::ident(&mut tree, "lamp");
    let member = build::field(&mut tree, receiver, "intensity");
    let decoy = build::ident(&mut tree, "intensity");
    let sum = build::binary(&mut tree, "+", member, decoy);
    let glow = build::var(&mut tree, "float", "glow", Some(sum));
    let g = build::ident(&mut tree, "glow");
    let color = build::call(&mut tree, "vec4", vec![g]);
    let target = build::ident(&mut tree, "gl_FragColor");
    let set = build::assign(&mut tree, "=", target, color);
    let stmt = build::expr_stmt(&mut tree, set);
    let main = build::function(&mut tree, "void", "main", vec![], vec![lamp, glow, stmt]);

    tree.push_child(root, light_struct);
    tree.push_child(root, global);
    tree.push_child(root, main);

    let mut unit = unit("fragment.glsl", tree);
    let mut ctx = BuildContext::new(BuildOptions {
        optimize: false,
        obfuscate: true,
    });
    let out = compile_unit(&mut unit, &mut ctx).unwrap();

    assert!(!out.contains("intensity"));
    assert!(!out.contains("Light"));
    assert!(!out.contains("lamp"));

    // The struct body's single member line.
    let member = out
        .lines()
        .skip_while(|l| !l.starts_with("struct "))
        .nth(1)
        .unwrap()
        .trim()
        .strip_prefix("float ")
        .unwrap()
        .trim_end_matches(';');

    // The one expression with a field access: "float X = Y.Z + W;".
    let access_line = out.lines().find(|l| l.contains('.')).unwrap();
    let field = access_line
        .split('.')
        .nth(1)
        .unwrap()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap();
    assert_eq!(field, member);
}
