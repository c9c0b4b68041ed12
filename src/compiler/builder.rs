//! The node builder: owns one compile's context stack and per-compile declarations.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::ops::{Deref, DerefMut};

use anyhow::{Context, Result, bail};

use super::config::BuilderConfig;
use super::context::{ContextOverrideSet, ContextStack, ContextValue};
use super::node_compiler::attribute::NormalSpace;
use super::node_compiler::{NodeId, ShaderNode};
use super::types::{LocalDecl, ShaderFragment, TextureBinding, TextureDimension, TypedExpr, ValueType};
use super::utils::{coerce_to, sanitize_wgsl_ident};

/// Drives code generation for a node graph.
///
/// One builder serves one compile at a time. Nodes only ever see it through
/// `&mut`, so compiles running in parallel each need their own builder.
#[derive(Debug, Default)]
pub struct NodeBuilder {
    config: BuilderConfig,
    stack: ContextStack,
    /// Frames below this depth belong to an enclosing scope and cannot be popped.
    scope_floor: usize,
    locals: Vec<LocalDecl>,
    local_by_node: HashMap<NodeId, usize>,
    textures: Vec<TextureBinding>,
    texture_index: HashMap<String, usize>,
}

impl NodeBuilder {
    /// Create a builder for `config`, rejecting configs that cannot produce a valid module.
    pub fn new(config: BuilderConfig) -> Result<Self> {
        config.validate().context("invalid builder config")?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    // ---- context stack ----

    pub fn push_context(&mut self, overrides: ContextOverrideSet) {
        log::trace!(
            "push context frame {} ({} keys)",
            self.stack.depth(),
            overrides.len()
        );
        self.stack.push(overrides);
    }

    /// Pop the innermost frame.
    ///
    /// Inside a [`ContextGuard`] only frames pushed within that scope can be popped;
    /// the guard's own frame and everything below it stay until the guard drops.
    pub fn pop_context(&mut self) -> Option<ContextOverrideSet> {
        if self.stack.depth() <= self.scope_floor {
            log::warn!(
                "pop_context below scope floor {} ignored",
                self.scope_floor
            );
            return None;
        }
        let frame = self.stack.pop();
        log::trace!("pop context frame {}", self.stack.depth());
        frame
    }

    /// Push `overrides` and return a guard that pops it again when dropped.
    ///
    /// The guard derefs to the builder, so the wrapped subtree is generated through it.
    /// Dropping restores the stack to the depth it had before the push, on normal
    /// return, on `?` propagation and while unwinding.
    pub fn scoped_context(&mut self, overrides: ContextOverrideSet) -> ContextGuard<'_> {
        let depth = self.stack.depth();
        let outer_floor = self.scope_floor;
        self.push_context(overrides);
        self.scope_floor = depth + 1;
        ContextGuard {
            builder: self,
            depth,
            outer_floor,
        }
    }

    pub fn context_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Shadowed lookup: the innermost frame defining `key` wins.
    pub fn get_context_value(&self, key: &str) -> Option<ContextValue> {
        self.stack.get(key).cloned()
    }

    pub fn context_stack(&self) -> &ContextStack {
        &self.stack
    }

    // ---- generation ----

    /// Dispatch entry point: generate `node` and coerce the result to `output`.
    pub fn generate(&mut self, node: &dyn ShaderNode, output: ValueType) -> Result<TypedExpr> {
        let code = node.generate(self, output)?;
        self.coerce(code, output)
            .with_context(|| format!("{node:?} result cannot be used as {output}"))
    }

    /// Generate a value installed in the context.
    pub fn generate_value(&mut self, value: &ContextValue, output: ValueType) -> Result<TypedExpr> {
        match value {
            ContextValue::Node(node) => self.generate(node.as_ref(), output),
            ContextValue::Literal(expr) => self.coerce(expr.clone(), output),
        }
    }

    /// Coercion between a declared result type and a requested output type.
    /// See [`coerce_to`] for the table.
    pub fn coerce(&self, expr: TypedExpr, target: ValueType) -> Result<TypedExpr> {
        coerce_to(expr, target)
    }

    /// Declare a function-local variable for a runtime value owned by `node`.
    ///
    /// Repeated calls for the same node return the name chosen the first time.
    pub fn declare_local(&mut self, node: NodeId, ty: ValueType, init: impl Into<String>) -> String {
        if let Some(&idx) = self.local_by_node.get(&node) {
            return self.locals[idx].name.clone();
        }
        let idx = self.locals.len();
        let name = format!("nf_{}_{idx}", Self::local_prefix(ty));
        self.locals.push(LocalDecl {
            name: name.clone(),
            ty,
            init: init.into(),
        });
        self.local_by_node.insert(node, idx);
        name
    }

    fn local_prefix(ty: ValueType) -> &'static str {
        match ty {
            ValueType::F32 => "float",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
            ValueType::Vec4 => "vec4",
            ValueType::Mat4 => "mat4",
        }
    }

    /// Register an environment texture and return its binding index.
    pub fn register_texture(&mut self, name: &str, dimension: TextureDimension) -> Result<usize> {
        if let Some(&idx) = self.texture_index.get(name) {
            let existing = self.textures[idx].dimension;
            if existing != dimension {
                bail!(
                    "texture {name} is sampled both as {} and {}",
                    existing.wgsl(),
                    dimension.wgsl()
                );
            }
            return Ok(idx);
        }
        let idx = self.textures.len();
        self.textures.push(TextureBinding {
            name: name.to_string(),
            dimension,
        });
        self.texture_index.insert(name.to_string(), idx);
        Ok(idx)
    }

    /// Generate the WGSL variable name for a texture binding.
    pub fn tex_var_name(name: &str) -> String {
        format!("env_tex_{}", sanitize_wgsl_ident(name))
    }

    /// Generate the WGSL variable name for a sampler binding.
    pub fn sampler_var_name(name: &str) -> String {
        format!("env_samp_{}", sanitize_wgsl_ident(name))
    }

    /// WGSL expression for the surface normal in `space`.
    pub fn normal_expr(&self, space: NormalSpace) -> String {
        let c = &self.config;
        match space {
            NormalSpace::Local => format!("{}.{}", c.input_name, c.normal_field),
            NormalSpace::View => format!("normalize({}.{})", c.input_name, c.view_normal_field),
            // Row-vector multiply applies the transpose, i.e. the inverse rotation.
            NormalSpace::World => format!(
                "normalize((vec4f({}.{}, 0.0) * {}).xyz)",
                c.input_name, c.view_normal_field, c.view_matrix
            ),
        }
    }

    // ---- compile ----

    /// Compile `root` into a standalone module returning `output`.
    ///
    /// Declarations from any previous compile are discarded first. On failure the
    /// builder is left without partial declarations and with the context stack it had
    /// on entry.
    pub fn build(&mut self, root: &dyn ShaderNode, output: ValueType) -> Result<ShaderFragment> {
        self.reset_compile_state();
        let depth = self.stack.depth();
        log::debug!("compile {root:?} as {output}");

        let result = self
            .generate(root, output)
            .and_then(|expr| self.assemble(expr));

        debug_assert_eq!(self.stack.depth(), depth, "context frame leaked by compile");
        match result {
            Ok(fragment) => {
                log::debug!(
                    "compiled {root:?}: {} locals, {} textures",
                    fragment.locals.len(),
                    fragment.textures.len()
                );
                Ok(fragment)
            }
            Err(e) => {
                self.reset_compile_state();
                Err(e)
            }
        }
    }

    fn reset_compile_state(&mut self) {
        self.locals.clear();
        self.local_by_node.clear();
        self.textures.clear();
        self.texture_index.clear();
    }

    fn assemble(&self, expr: TypedExpr) -> Result<ShaderFragment> {
        let c = &self.config;
        let mut module = String::new();

        writeln!(module, "struct {} {{", c.input_struct)?;
        writeln!(module, "    {}: vec2f,", c.uv_field)?;
        writeln!(module, "    {}: vec3f,", c.normal_field)?;
        writeln!(module, "    {}: vec3f,", c.view_normal_field)?;
        writeln!(module, "}};")?;
        writeln!(module)?;

        for (i, tex) in self.textures.iter().enumerate() {
            let binding = i * 2;
            writeln!(
                module,
                "@group(0) @binding({binding}) var {}: {};",
                Self::tex_var_name(&tex.name),
                tex.dimension.wgsl()
            )?;
            writeln!(
                module,
                "@group(0) @binding({}) var {}: sampler;",
                binding + 1,
                Self::sampler_var_name(&tex.name)
            )?;
        }
        if !self.textures.is_empty() {
            writeln!(module)?;
        }

        let mut params = vec![format!("{}: {}", c.input_name, c.input_struct)];
        params.extend(c.params.iter().map(|p| format!("{}: {}", p.name, p.ty.wgsl())));
        writeln!(
            module,
            "fn {}({}) -> {} {{",
            c.function_name,
            params.join(", "),
            expr.ty.wgsl()
        )?;
        for local in &self.locals {
            writeln!(module, "    var {}: {} = {};", local.name, local.ty.wgsl(), local.init)?;
        }
        writeln!(module, "    return {};", expr.expr)?;
        writeln!(module, "}}")?;

        Ok(ShaderFragment {
            expr,
            locals: self.locals.clone(),
            textures: self.textures.clone(),
            module,
        })
    }
}

/// Keeps one context frame pushed for as long as it lives.
///
/// Created by [`NodeBuilder::scoped_context`].
pub struct ContextGuard<'a> {
    builder: &'a mut NodeBuilder,
    depth: usize,
    outer_floor: usize,
}

impl Deref for ContextGuard<'_> {
    type Target = NodeBuilder;

    fn deref(&self) -> &NodeBuilder {
        self.builder
    }
}

impl DerefMut for ContextGuard<'_> {
    fn deref_mut(&mut self) -> &mut NodeBuilder {
        self.builder
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.builder.stack.truncate(self.depth);
        self.builder.scope_floor = self.outer_floor;
        log::trace!("restored context to depth {}", self.depth);
    }
}
