//! Formatting helpers and the type coercion table.

use anyhow::{Result, bail};

use super::types::{TypedExpr, ValueType};

/// Format a float as a WGSL float literal (`1.0`, `0.5`, `1e-10`).
///
/// The shortest representation that reads back as the same f32; it always carries
/// a decimal point or an exponent, so it never parses as an integer.
/// WGSL has no literal for NaN or infinity, so non-finite values are rejected.
pub fn float_literal(v: f32) -> Result<String> {
    if !v.is_finite() {
        bail!("float literal must be finite, got {v}");
    }
    Ok(format!("{v:?}"))
}

/// Sanitize a string to be a valid WGSL identifier.
pub fn sanitize_wgsl_ident(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        out.push('_');
    }
    out
}

/// Splat an f32 expression to a target vector type.
pub fn splat_f32(x: &TypedExpr, target: ValueType) -> Result<TypedExpr> {
    if x.ty != ValueType::F32 {
        bail!("expected f32 for splat, got {:?}", x.ty);
    }
    Ok(match target {
        ValueType::F32 => x.clone(),
        ValueType::Vec2 => TypedExpr::with_const(format!("vec2f({})", x.expr), ValueType::Vec2, x.is_const),
        ValueType::Vec3 => TypedExpr::with_const(format!("vec3f({})", x.expr), ValueType::Vec3, x.is_const),
        ValueType::Vec4 => TypedExpr::with_const(
            format!("vec4f({}, {}, {}, 1.0)", x.expr, x.expr, x.expr),
            ValueType::Vec4,
            x.is_const,
        ),
        ValueType::Mat4 => bail!("cannot splat f32 to {}", target.wgsl()),
    })
}

/// Coerce two typed expressions for binary operations (promoting scalars to vectors as needed).
pub fn coerce_for_binary(a: TypedExpr, b: TypedExpr) -> Result<(TypedExpr, TypedExpr, ValueType)> {
    if a.ty == b.ty {
        let ty = a.ty;
        return Ok((a, b, ty));
    }
    // Promote scalar to vector if needed.
    if a.ty == ValueType::F32 && b.ty.is_vector() {
        let target_ty = b.ty;
        let aa = splat_f32(&a, b.ty)?;
        return Ok((aa, b, target_ty));
    }
    if b.ty == ValueType::F32 && a.ty.is_vector() {
        let target_ty = a.ty;
        let bb = splat_f32(&b, a.ty)?;
        return Ok((a, bb, target_ty));
    }
    bail!("incompatible types for binary op: {:?} and {:?}", a.ty, b.ty);
}

/// Coerce an expression to the requested output type.
///
/// | from \ to | f32     | vec2f          | vec3f             | vec4f                  |
/// |-----------|---------|----------------|-------------------|------------------------|
/// | f32       | -       | `vec2f(x)`     | `vec3f(x)`        | `vec4f(x, x, x, 1.0)`  |
/// | vec2f     | `(x).x` | -              | `vec3f(x, 0.0)`   | `vec4f(x, 0.0, 1.0)`   |
/// | vec3f     | `(x).x` | `(x).xy`       | -                 | `vec4f(x, 1.0)`        |
/// | vec4f     | `(x).x` | `(x).xy`       | `(x).xyz`         | -                      |
///
/// `mat4x4f` only coerces to itself.
pub fn coerce_to(x: TypedExpr, target: ValueType) -> Result<TypedExpr> {
    if x.ty == target {
        return Ok(x);
    }
    let (Some(from_n), Some(to_n)) = (x.ty.components(), target.components()) else {
        bail!("cannot coerce {} to {}", x.ty.wgsl(), target.wgsl());
    };

    if from_n == 1 {
        return splat_f32(&x, target);
    }

    let expr = if to_n < from_n {
        let swizzle = &"xyzw"[..to_n];
        format!("({}).{swizzle}", x.expr)
    } else {
        match (x.ty, target) {
            (ValueType::Vec2, ValueType::Vec3) => format!("vec3f({}, 0.0)", x.expr),
            (ValueType::Vec2, ValueType::Vec4) => format!("vec4f({}, 0.0, 1.0)", x.expr),
            (ValueType::Vec3, ValueType::Vec4) => format!("vec4f({}, 1.0)", x.expr),
            (from, to) => bail!("cannot coerce {} to {}", from.wgsl(), to.wgsl()),
        }
    };
    Ok(TypedExpr::with_const(expr, target, x.is_const))
}
