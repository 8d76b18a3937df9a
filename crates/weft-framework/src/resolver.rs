//! Aspect discovery and per-container interceptor caching.
//!
//! ```text
//!            interceptors(container)
//! Uncached ──────────────────────────▶ Resolving ──────────▶ Cached
//!    ▲                                                          │
//!    └──────────────────── invalidate(id) ──────────────────────┘
//! ```
//!
//! Scanning happens outside the cache lock. Two threads racing on the same
//! container may both scan; the first result published wins and both
//! callers observe that same list. A scan that overlaps `invalidate` is
//! returned to its caller but never published.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};
use weft_core::{BeanContainer, BeanDefinition, BeanScope, TypeRef};

use crate::advice::{AdviceKind, AnnotationNames};
use crate::error::{AdviceResult, ResolveError, ResolveResult};
use crate::interceptor::Interceptor;

/// Shared, ordered interceptor list of one container.
pub type InterceptorList = Arc<[Arc<Interceptor>]>;

/// Resolution state of one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Uncached,
    Resolving,
    Cached,
}

/// Builds interceptors from aspect beans and weaves them onto bean types.
#[derive(Debug)]
pub struct AspectResolver {
    names: AnnotationNames,
    strict: bool,
    advise_aspects: bool,
    cache: RwLock<HashMap<String, InterceptorList>>,
    resolving: Mutex<HashMap<String, usize>>,
    /// Bumped by every `invalidate`, under the cache write lock.
    generations: Mutex<HashMap<String, u64>>,
}

impl Default for AspectResolver {
    fn default() -> Self {
        Self::new(AnnotationNames::default())
    }
}

impl AspectResolver {
    /// Creates a lenient resolver using the given annotation vocabulary.
    pub fn new(names: AnnotationNames) -> Self {
        Self {
            names,
            strict: false,
            advise_aspects: false,
            cache: RwLock::new(HashMap::new()),
            resolving: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
        }
    }

    /// Fail the whole container on the first invalid aspect.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Allow aspect beans to be advised themselves.
    pub fn advise_aspects(mut self, advise: bool) -> Self {
        self.advise_aspects = advise;
        self
    }

    pub fn names(&self) -> &AnnotationNames {
        &self.names
    }

    pub fn state(&self, container_id: &str) -> ResolutionState {
        if self.cache.read().contains_key(container_id) {
            ResolutionState::Cached
        } else if self.resolving.lock().contains_key(container_id) {
            ResolutionState::Resolving
        } else {
            ResolutionState::Uncached
        }
    }

    /// Drops the cached list of a container. Returns `true` if one existed.
    ///
    /// A scan of the container still in flight will not be cached.
    pub fn invalidate(&self, container_id: &str) -> bool {
        let mut cache = self.cache.write();
        *self
            .generations
            .lock()
            .entry(container_id.to_string())
            .or_default() += 1;
        let removed = cache.remove(container_id).is_some();
        if removed {
            debug!(container = %container_id, "Interceptor cache invalidated");
        }
        removed
    }

    /// Interceptors of every aspect visible from `container`: plugin-scoped
    /// aspects first, then global ones, each scope ordered by aspect order.
    pub fn interceptors(&self, container: &dyn BeanContainer) -> ResolveResult<InterceptorList> {
        let id = container.id();
        if let Some(cached) = self.cache.read().get(id) {
            return Ok(Arc::clone(cached));
        }

        let generation = self.generation(id);
        *self.resolving.lock().entry(id.to_string()).or_default() += 1;
        let scanned = self.scan(container);
        {
            let mut resolving = self.resolving.lock();
            if let Some(count) = resolving.get_mut(id) {
                *count -= 1;
                if *count == 0 {
                    resolving.remove(id);
                }
            }
        }
        let list: InterceptorList = scanned?.into();

        let mut cache = self.cache.write();
        if self.generation(id) != generation {
            debug!(container = %id, "Container invalidated during scan, not caching");
            return Ok(list);
        }
        let published = cache.entry(id.to_string()).or_insert_with(|| {
            info!(container = %id, interceptors = list.len(), "Interceptors resolved");
            Arc::clone(&list)
        });
        Ok(Arc::clone(published))
    }

    /// The interceptors that apply to beans of type `ty`, in order.
    ///
    /// Every matching method is committed on the interceptor's matcher, so
    /// join points of those methods can be bound afterwards.
    pub fn resolve(
        &self,
        container: &dyn BeanContainer,
        ty: &TypeRef,
    ) -> ResolveResult<Vec<Arc<Interceptor>>> {
        if !self.advise_aspects && ty.has_annotation(&self.names.aspect) {
            debug!(ty = ty.name(), "Skipping aspect type");
            return Ok(Vec::new());
        }

        let methods = ty.methods();
        let mut woven = Vec::new();
        for interceptor in self.interceptors(container)?.iter() {
            let matcher = interceptor.matcher();
            if !matcher.could_match(ty.as_ref()) {
                continue;
            }
            let mut matched = false;
            for method in &methods {
                let result = matcher.matches_on(ty, method);
                if result.matches() {
                    matcher.choose(method, &result);
                    matched = true;
                }
            }
            if matched {
                debug!(
                    ty = ty.name(),
                    aspect = %interceptor.aspect(),
                    advice = interceptor.advice_method().name(),
                    "Interceptor applies"
                );
                woven.push(Arc::clone(interceptor));
            }
        }
        Ok(woven)
    }

    fn generation(&self, container_id: &str) -> u64 {
        self.generations
            .lock()
            .get(container_id)
            .copied()
            .unwrap_or_default()
    }

    fn scan(&self, container: &dyn BeanContainer) -> ResolveResult<Vec<Arc<Interceptor>>> {
        let mut interceptors = Vec::new();
        for scope in [BeanScope::Plugin, BeanScope::Global] {
            let mut aspects: Vec<(Option<i64>, BeanDefinition)> = container
                .beans(scope)
                .into_iter()
                .filter(|bean| bean.type_info().has_annotation(&self.names.aspect))
                .map(|bean| {
                    let order = bean
                        .type_info()
                        .find_annotation(&self.names.order)
                        .and_then(|a| a.i64_attribute("value"));
                    (order, bean)
                })
                .collect();
            aspects.sort_by_key(|(order, _)| order.map_or((1, 0), |o| (0, o)));

            for (_, bean) in aspects {
                match self.build_aspect(&bean) {
                    Ok(built) => {
                        debug!(
                            container = %container.id(),
                            aspect = %bean.name(),
                            ?scope,
                            advice = built.len(),
                            "Aspect registered"
                        );
                        interceptors.extend(built.into_iter().map(Arc::new));
                    }
                    Err(source) => {
                        let err = ResolveError {
                            aspect: bean.name().to_string(),
                            source,
                        };
                        if self.strict {
                            error!(error = %err, "Aspect rejected");
                            return Err(err);
                        }
                        warn!(error = %err, "Aspect skipped");
                    }
                }
            }
        }
        Ok(interceptors)
    }

    fn build_aspect(&self, bean: &BeanDefinition) -> AdviceResult<Vec<Interceptor>> {
        let mut built = Vec::new();
        for method in bean.type_info().methods() {
            for kind in AdviceKind::ALL {
                if let Some(annotation) = method.annotation(kind.annotation(&self.names)) {
                    built.push(Interceptor::build(
                        bean.name(),
                        bean.instance().clone(),
                        Arc::clone(&method),
                        kind,
                        annotation,
                        &self.names,
                    )?);
                }
            }
        }
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdviceError;
    use weft_core::{Annotation, Instance, MethodDescriptor, TypeDescriptor};

    struct Container {
        id: String,
        plugin: Vec<BeanDefinition>,
        global: Vec<BeanDefinition>,
    }

    impl BeanContainer for Container {
        fn id(&self) -> &str {
            &self.id
        }

        fn beans(&self, scope: BeanScope) -> Vec<BeanDefinition> {
            match scope {
                BeanScope::Plugin => self.plugin.clone(),
                BeanScope::Global => self.global.clone(),
            }
        }
    }

    fn string() -> TypeRef {
        TypeDescriptor::named("java.lang.String")
    }

    fn aspect(name: &str, order: Option<i64>, pointcut: &str) -> BeanDefinition {
        let mut builder = TypeDescriptor::builder(format!("demo.{name}"))
            .annotated(Annotation::new("Aspect"))
            .method(
                MethodDescriptor::builder("before")
                    .annotated(Annotation::new("Before").with("value", pointcut)),
            );
        if let Some(order) = order {
            builder = builder.annotated(Annotation::new("Order").with("value", order));
        }
        BeanDefinition::new(name, Instance::new(builder.build(), ()))
    }

    fn service() -> TypeRef {
        TypeDescriptor::builder("demo.TestService1")
            .method(MethodDescriptor::builder("m1"))
            .method(MethodDescriptor::builder("m2").param("s", string()))
            .build()
    }

    fn names(list: &[Arc<Interceptor>]) -> Vec<&str> {
        list.iter().map(|i| i.aspect()).collect()
    }

    #[test]
    fn test_plugin_before_global_and_ordered() {
        let container = Container {
            id: "plugin-a".to_string(),
            plugin: vec![
                aspect("late", None, "within(demo..*)"),
                aspect("second", Some(2), "within(demo..*)"),
                aspect("first", Some(1), "within(demo..*)"),
            ],
            global: vec![aspect("shared", Some(0), "within(demo..*)")],
        };
        let resolver = AspectResolver::default();
        let list = resolver.interceptors(&container).unwrap();
        assert_eq!(names(&list), vec!["first", "second", "late", "shared"]);
    }

    #[test]
    fn test_cache_states() {
        let container = Container {
            id: "c".to_string(),
            plugin: vec![aspect("a", None, "execution(* m2(..))")],
            global: vec![],
        };
        let resolver = AspectResolver::default();
        assert_eq!(resolver.state("c"), ResolutionState::Uncached);

        let first = resolver.interceptors(&container).unwrap();
        assert_eq!(resolver.state("c"), ResolutionState::Cached);
        let second = resolver.interceptors(&container).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(resolver.invalidate("c"));
        assert_eq!(resolver.state("c"), ResolutionState::Uncached);
        let third = resolver.interceptors(&container).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_resolve_filters_by_type() {
        let container = Container {
            id: "c".to_string(),
            plugin: vec![
                aspect("m2Only", None, "execution(* m2(String))"),
                aspect("other", None, "within(other..*)"),
            ],
            global: vec![],
        };
        let resolver = AspectResolver::default();
        let ty = service();
        let woven = resolver.resolve(&container, &ty).unwrap();
        assert_eq!(names(&woven), vec!["m2Only"]);

        let m2 = ty.methods().into_iter().find(|m| m.name() == "m2").unwrap();
        let m1 = ty.methods().into_iter().find(|m| m.name() == "m1").unwrap();
        assert!(woven[0].matcher().shadow(&m2).is_some());
        assert!(woven[0].matcher().shadow(&m1).is_none());
    }

    #[test]
    fn test_aspects_are_not_self_advised() {
        let bean = aspect("self", None, "within(demo..*)");
        let container = Container {
            id: "c".to_string(),
            plugin: vec![bean.clone()],
            global: vec![],
        };
        let ty = bean.type_info().clone();

        let resolver = AspectResolver::default();
        assert!(resolver.resolve(&container, &ty).unwrap().is_empty());

        let resolver = AspectResolver::default().advise_aspects(true);
        assert_eq!(resolver.resolve(&container, &ty).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_aspect_lenient_and_strict() {
        let container = Container {
            id: "c".to_string(),
            plugin: vec![
                aspect("broken", None, "execution(* m2(..)"),
                aspect("fine", None, "within(demo..*)"),
            ],
            global: vec![],
        };

        let lenient = AspectResolver::default();
        assert_eq!(names(&lenient.interceptors(&container).unwrap()), vec!["fine"]);

        let strict = AspectResolver::default().strict(true);
        let err = strict.interceptors(&container).unwrap_err();
        assert_eq!(err.aspect, "broken");
        assert!(matches!(err.source, AdviceError::Parse(_)));
        assert_eq!(strict.state("c"), ResolutionState::Uncached);
    }

    /// Registers `late` and invalidates the resolver on its first scan.
    struct Registering {
        resolver: Arc<AspectResolver>,
        beans: Mutex<Vec<BeanDefinition>>,
        late: Mutex<Option<BeanDefinition>>,
    }

    impl BeanContainer for Registering {
        fn id(&self) -> &str {
            "c"
        }

        fn beans(&self, scope: BeanScope) -> Vec<BeanDefinition> {
            if scope == BeanScope::Global {
                return Vec::new();
            }
            let snapshot = self.beans.lock().clone();
            if let Some(late) = self.late.lock().take() {
                self.beans.lock().push(late);
                self.resolver.invalidate("c");
            }
            snapshot
        }
    }

    #[test]
    fn test_invalidate_during_scan_is_not_cached() {
        let resolver = Arc::new(AspectResolver::default());
        let container = Registering {
            resolver: Arc::clone(&resolver),
            beans: Mutex::new(vec![aspect("early", None, "within(demo..*)")]),
            late: Mutex::new(Some(aspect("late", None, "within(demo..*)"))),
        };

        let stale = resolver.interceptors(&container).unwrap();
        assert_eq!(names(&stale), vec!["early"]);
        assert_eq!(resolver.state("c"), ResolutionState::Uncached);

        let fresh = resolver.interceptors(&container).unwrap();
        assert_eq!(names(&fresh), vec!["early", "late"]);
        assert_eq!(resolver.state("c"), ResolutionState::Cached);
    }

    #[test]
    fn test_concurrent_resolution_publishes_once() {
        let container = Arc::new(Container {
            id: "shared".to_string(),
            plugin: vec![
                aspect("first", Some(1), "within(demo..*)"),
                aspect("second", Some(2), "execution(* m2(..))"),
            ],
            global: vec![aspect("global", None, "within(demo..*)")],
        });
        let resolver = Arc::new(AspectResolver::default());
        let barrier = Arc::new(std::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let container = Arc::clone(&container);
                let resolver = Arc::clone(&resolver);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    resolver.interceptors(container.as_ref()).unwrap()
                })
            })
            .collect();
        let lists: Vec<InterceptorList> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let cached = resolver.interceptors(container.as_ref()).unwrap();
        for list in &lists {
            assert!(Arc::ptr_eq(list, &cached));
        }
        assert_eq!(names(&cached), vec!["first", "second", "global"]);
        assert_eq!(resolver.state("shared"), ResolutionState::Cached);
    }
}
