//! Reserved GLSL identifiers.
//!
//! Keywords, builtin types, builtin functions and the `gl_` namespace are
//! off limits both for user declarations (declaring one is a hard error,
//! entry point excepted) and for generated short names.

/// The well-known shader entry point.
pub const ENTRY_POINT: &str = "main";

/// GLSL keywords and builtin type names.
pub const KEYWORDS: &[&str] = &[
    "attribute", "bool", "break", "bvec2", "bvec3", "bvec4", "const", "continue", "discard",
    "do", "else", "false", "float", "for", "highp", "if", "in", "inout", "int", "invariant",
    "ivec2", "ivec3", "ivec4", "lowp", "mat2", "mat3", "mat4", "mediump", "out", "precision",
    "return", "sampler2D", "samplerCube", "struct", "true", "uniform", "varying", "vec2",
    "vec3", "vec4", "void", "while",
];

/// Builtin functions callable without declaration.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    "abs", "acos", "all", "any", "asin", "atan", "ceil", "clamp", "cos", "cross", "dFdx",
    "dFdy", "degrees", "distance", "dot", "equal", "exp", "exp2", "faceforward", "floor",
    "fract", "fwidth", "greaterThan", "greaterThanEqual", "inversesqrt", "length", "lessThan",
    "lessThanEqual", "log", "log2", "matrixCompMult", "max", "min", "mix", "mod", "normalize",
    "not", "notEqual", "pow", "radians", "reflect", "refract", "sign", "sin", "smoothstep",
    "sqrt", "step", "tan", "texture2D", "texture2DLod", "texture2DProj", "textureCube",
    "textureCubeLod",
];

/// The entry point plus names the renamer must never emit or touch.
pub const PINNED: &[&str] = &[ENTRY_POINT];

/// Extensions this toolchain understands.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "GL_EXT_draw_buffers",
    "GL_EXT_frag_depth",
    "GL_EXT_shader_texture_lod",
    "GL_OES_standard_derivatives",
    "GL_OES_texture_float",
    "GL_OES_texture_float_linear",
];

/// The wildcard extension name; only `warn`/`disable` behaviors apply to it.
pub const WILDCARD_EXTENSION: &str = "all";

/// Identifiers an enabled extension reserves beyond the `gl_` namespace.
pub fn extension_reserved(extension: &str) -> &'static [&'static str] {
    match extension {
        "GL_EXT_shader_texture_lod" => &[
            "texture2DGradEXT",
            "texture2DLodEXT",
            "texture2DProjGradEXT",
            "texture2DProjLodEXT",
            "textureCubeGradEXT",
            "textureCubeLodEXT",
        ],
        "GL_OES_standard_derivatives" => &["dFdx", "dFdy", "fwidth"],
        _ => &[],
    }
}

/// Whether `name` is reserved: a keyword, a builtin, or in the `gl_`/`__`
/// namespaces reserved by the GLSL spec.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with("gl_")
        || name.starts_with("__")
        || KEYWORDS.binary_search(&name).is_ok()
        || BUILTIN_FUNCTIONS.binary_search(&name).is_ok()
}

/// Whether `name` could be a vector swizzle (`xyzw`, `rgba`, `stpq` sets).
///
/// Unresolved field accesses made solely of swizzle letters are component
/// selections, not identifiers, and are never "undeclared".
pub fn is_swizzle(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 4
        && (name.chars().all(|c| "xyzw".contains(c))
            || name.chars().all(|c| "rgba".contains(c))
            || name.chars().all(|c| "stpq".contains(c)))
}
