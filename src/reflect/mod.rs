// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vfxgraph and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Runtime type resolution against the host model.
//!
//! Host types are registered once from a fixed set of [`TypeModule`]s. Lookups try each
//! candidate as a qualified name, then scan every module by short or qualified name.
//! Successful resolutions are cached for the lifetime of the resolver; the process-wide
//! resolver returned by [`TypeResolver::global`] therefore never forgets a type until
//! restart.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use smallvec::SmallVec;
use smol_str::SmolStr;
use tracing::debug;

use crate::model::{Assignability, AttributeSetter, ModelNode, Value, ValueType};

mod host;

pub use host::{
    builtin_modules, BLOCK_TYPE, CONTEXT_TYPE, INLINE_OPERATOR_TYPE, OPERATOR_TYPE,
    PARAMETER_TYPE, SETTING_ACCESSOR, SETTING_MUTATOR,
};

pub type MemberGetter = fn(&ModelNode) -> Value;
pub type MethodInvoker = fn(&mut ModelNode, &[Value]) -> Result<Value, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// Which members a lookup may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberScope {
    #[default]
    Public,
    All,
}

impl MemberScope {
    fn admits(self, visibility: Visibility) -> bool {
        matches!(
            (self, visibility),
            (Self::All, _) | (Self::Public, Visibility::Public)
        )
    }
}

#[derive(Clone)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub value_type: ValueType,
    pub visibility: Visibility,
    pub get: MemberGetter,
    pub set: Option<AttributeSetter>,
}

#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub params: SmallVec<[ValueType; 4]>,
    pub visibility: Visibility,
    pub invoke: MethodInvoker,
}

impl MethodDescriptor {
    /// Worst-case binding of `args` to this overload's parameters.
    fn binding(&self, args: &[Value]) -> Assignability {
        self.params
            .iter()
            .zip(args)
            .map(|(param, arg)| param.accepts(arg.value_type()))
            .max()
            .unwrap_or(Assignability::Exact)
    }
}

#[derive(Clone)]
pub struct TypeDescriptor {
    qualified_name: SmolStr,
    short_name: SmolStr,
    members: Vec<MemberDescriptor>,
    methods: Vec<MethodDescriptor>,
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("qualified_name", &self.qualified_name)
            .field(
                "members",
                &self.members.iter().map(|m| m.name).collect::<Vec<_>>(),
            )
            .field(
                "methods",
                &self.methods.iter().map(|m| m.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TypeDescriptor {
    pub fn new(qualified_name: &str) -> Self {
        let short_name = qualified_name
            .rsplit_once('.')
            .map(|(_, short)| short)
            .unwrap_or(qualified_name);
        Self {
            qualified_name: SmolStr::new(qualified_name),
            short_name: SmolStr::new(short_name),
            members: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn with_member(
        mut self,
        name: &'static str,
        value_type: ValueType,
        visibility: Visibility,
        get: MemberGetter,
        set: Option<AttributeSetter>,
    ) -> Self {
        self.members.push(MemberDescriptor {
            name,
            value_type,
            visibility,
            get,
            set,
        });
        self
    }

    pub fn with_method(
        mut self,
        name: &'static str,
        params: &[ValueType],
        invoke: MethodInvoker,
    ) -> Self {
        self.methods.push(MethodDescriptor {
            name,
            params: params.iter().copied().collect(),
            visibility: Visibility::Public,
            invoke,
        });
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn member(&self, name: &str, scope: MemberScope) -> Option<&MemberDescriptor> {
        self.members
            .iter()
            .find(|member| member.name == name && scope.admits(member.visibility))
    }

    /// True when `name` is a public member with a setter.
    pub fn has_settable_member(&self, name: &str) -> bool {
        self.member(name, MemberScope::Public)
            .is_some_and(|member| member.set.is_some())
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|method| method.name == name)
    }

    fn matches_name(&self, name: &str) -> bool {
        self.short_name == name || self.qualified_name == name
    }
}

/// A named group of host types, scanned in registration order.
#[derive(Debug, Clone)]
pub struct TypeModule {
    name: SmolStr,
    types: Vec<Arc<TypeDescriptor>>,
}

impl TypeModule {
    pub fn new(name: &str, types: Vec<TypeDescriptor>) -> Self {
        Self {
            name: SmolStr::new(name),
            types: types.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    #[error("no host type matches any of [{}]", .candidates.join(", "))]
    TypeNotFound { candidates: Vec<String> },
    #[error("type {type_name} has no member {member:?}")]
    MemberMissing { type_name: String, member: String },
    #[error("member {member:?} on {type_name} is read-only")]
    ReadOnlyMember { type_name: String, member: String },
    #[error("type {type_name} has no method {method:?} taking {arity} argument(s)")]
    MethodMissing {
        type_name: String,
        method: String,
        arity: usize,
    },
    #[error("no overload of {method:?} on {type_name} accepts ({args})")]
    NoMatchingOverload {
        type_name: String,
        method: String,
        args: String,
    },
    #[error("call to {method:?} on {type_name} is ambiguous between {overloads} overloads")]
    AmbiguousOverload {
        type_name: String,
        method: String,
        overloads: usize,
    },
    #[error("{method} on {type_name} failed: {reason}")]
    InvocationFailure {
        type_name: String,
        method: String,
        reason: String,
    },
}

pub struct TypeResolver {
    modules: Vec<TypeModule>,
    qualified: HashMap<SmolStr, Arc<TypeDescriptor>>,
    cache: Mutex<HashMap<SmolStr, Arc<TypeDescriptor>>>,
    scans: AtomicUsize,
}

static GLOBAL_RESOLVER: OnceLock<Arc<TypeResolver>> = OnceLock::new();

impl TypeResolver {
    pub fn new(modules: Vec<TypeModule>) -> Self {
        let mut qualified = HashMap::new();
        for module in &modules {
            for ty in &module.types {
                // First registration wins for duplicate qualified names.
                qualified
                    .entry(ty.qualified_name.clone())
                    .or_insert_with(|| Arc::clone(ty));
            }
        }
        Self {
            modules,
            qualified,
            cache: Mutex::new(HashMap::new()),
            scans: AtomicUsize::new(0),
        }
    }

    /// The process-wide resolver over the built-in host modules.
    pub fn global() -> Arc<TypeResolver> {
        Arc::clone(GLOBAL_RESOLVER.get_or_init(|| Arc::new(TypeResolver::new(builtin_modules()))))
    }

    /// Number of module scans performed so far (cache misses on the qualified index).
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    pub fn resolve_type<S: AsRef<str>>(
        &self,
        candidates: &[S],
    ) -> Result<Arc<TypeDescriptor>, ReflectError> {
        let key = cache_key(candidates);
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let resolved = candidates
            .iter()
            .find_map(|candidate| self.qualified.get(candidate.as_ref()).cloned())
            .or_else(|| self.scan_modules(candidates));

        match resolved {
            Some(ty) => {
                if let Ok(mut cache) = self.cache.lock() {
                    cache.insert(key, Arc::clone(&ty));
                }
                Ok(ty)
            }
            None => Err(ReflectError::TypeNotFound {
                candidates: candidates
                    .iter()
                    .map(|candidate| candidate.as_ref().to_owned())
                    .collect(),
            }),
        }
    }

    /// Resolves the host type backing `node`.
    pub fn type_of(&self, node: &ModelNode) -> Result<Arc<TypeDescriptor>, ReflectError> {
        self.resolve_type(&[node.type_name.as_str()])
    }

    pub fn get_member(
        &self,
        node: &ModelNode,
        name: &str,
        scope: MemberScope,
    ) -> Result<Value, ReflectError> {
        let ty = self.type_of(node)?;
        let member = ty
            .member(name, scope)
            .ok_or_else(|| ReflectError::MemberMissing {
                type_name: ty.qualified_name.to_string(),
                member: name.to_owned(),
            })?;
        Ok((member.get)(node))
    }

    /// The setter for a public member, for callers that queue the write.
    pub fn member_setter(
        &self,
        type_name: &str,
        name: &str,
    ) -> Result<AttributeSetter, ReflectError> {
        let ty = self.resolve_type(&[type_name])?;
        let member = ty
            .member(name, MemberScope::Public)
            .ok_or_else(|| ReflectError::MemberMissing {
                type_name: ty.qualified_name.to_string(),
                member: name.to_owned(),
            })?;
        member.set.ok_or_else(|| ReflectError::ReadOnlyMember {
            type_name: ty.qualified_name.to_string(),
            member: name.to_owned(),
        })
    }

    pub fn set_member(
        &self,
        node: &mut ModelNode,
        name: &str,
        value: Value,
    ) -> Result<(), ReflectError> {
        let setter = self.member_setter(&node.type_name.clone(), name)?;
        setter(node, value).map_err(|reason| ReflectError::InvocationFailure {
            type_name: node.type_name.clone(),
            method: format!("set {name}"),
            reason,
        })
    }

    /// Invokes `name` on `node`, choosing among same-name overloads.
    ///
    /// Overloads with the wrong arity are ignored. A unique exact match wins, then a
    /// unique assignable match; anything else is ambiguous.
    pub fn invoke_method(
        &self,
        node: &mut ModelNode,
        name: &str,
        args: &[Value],
    ) -> Result<Value, ReflectError> {
        let ty = self.type_of(node)?;
        let method = select_overload(&ty, name, args)?;
        (method.invoke)(node, args).map_err(|reason| ReflectError::InvocationFailure {
            type_name: ty.qualified_name.to_string(),
            method: name.to_owned(),
            reason,
        })
    }

    fn cached(&self, key: &str) -> Option<Arc<TypeDescriptor>> {
        self.cache.lock().ok()?.get(key).cloned()
    }

    fn scan_modules<S: AsRef<str>>(&self, candidates: &[S]) -> Option<Arc<TypeDescriptor>> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        candidates.iter().find_map(|candidate| {
            let candidate = candidate.as_ref();
            let short = candidate
                .rsplit_once('.')
                .map(|(_, short)| short)
                .unwrap_or(candidate);
            self.modules.iter().find_map(|module| {
                module
                    .types
                    .iter()
                    .find(|ty| ty.matches_name(candidate) || ty.matches_name(short))
                    .map(|ty| {
                        debug!(
                            candidate,
                            module = %module.name,
                            resolved = %ty.qualified_name,
                            "resolved host type by module scan"
                        );
                        Arc::clone(ty)
                    })
            })
        })
    }
}

fn cache_key<S: AsRef<str>>(candidates: &[S]) -> SmolStr {
    let mut key = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        if index > 0 {
            key.push('|');
        }
        key.push_str(candidate.as_ref());
    }
    SmolStr::new(key)
}

fn select_overload<'a>(
    ty: &'a TypeDescriptor,
    name: &str,
    args: &[Value],
) -> Result<&'a MethodDescriptor, ReflectError> {
    let same_arity = ty
        .methods
        .iter()
        .filter(|method| method.name == name && method.params.len() == args.len())
        .collect::<SmallVec<[&MethodDescriptor; 4]>>();
    if same_arity.is_empty() {
        return Err(ReflectError::MethodMissing {
            type_name: ty.qualified_name.to_string(),
            method: name.to_owned(),
            arity: args.len(),
        });
    }

    let bindings = same_arity
        .iter()
        .map(|method| (*method, method.binding(args)))
        .collect::<SmallVec<[_; 4]>>();

    let exact = bindings
        .iter()
        .filter(|(_, binding)| *binding == Assignability::Exact)
        .collect::<SmallVec<[_; 4]>>();
    if let [(method, _)] = exact.as_slice() {
        return Ok(*method);
    }

    let compatible = bindings
        .iter()
        .filter(|(_, binding)| *binding != Assignability::Incompatible)
        .collect::<SmallVec<[_; 4]>>();
    match compatible.as_slice() {
        [(method, _)] => Ok(*method),
        [] => Err(ReflectError::NoMatchingOverload {
            type_name: ty.qualified_name.to_string(),
            method: name.to_owned(),
            args: args
                .iter()
                .map(|arg| arg.value_type().map_or("null", ValueType::label))
                .collect::<Vec<_>>()
                .join(", "),
        }),
        many => Err(ReflectError::AmbiguousOverload {
            type_name: ty.qualified_name.to_string(),
            method: name.to_owned(),
            overloads: many.len(),
        }),
    }
}
