//! Exactly-once lazy construction of shared resources
//!
//! A [`LazyResource`] owns a factory and builds the resource on first demand.
//! Concurrent first callers race safely: the factory runs once, and every
//! caller, including the ones that waited, receives the same `Arc`.

use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

type Factory<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<T>, E>> + Send + Sync>;

/// Shared resource built on first use and kept for the process lifetime
pub struct LazyResource<T: ?Sized, E> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
    factory: Factory<T, E>,
}

impl<T, E> LazyResource<T, E>
where
    T: ?Sized + Send + Sync,
{
    /// Create an empty slot with the factory used to fill it.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use tubetutor_core::lazy::LazyResource;
    ///
    /// # async fn example() -> Result<(), std::io::Error> {
    /// let greeting: LazyResource<String, std::io::Error> =
    ///     LazyResource::new("greeting", || async { Ok(Arc::new("hello".to_string())) });
    ///
    /// let first = greeting.get_or_init().await?;
    /// let second = greeting.get_or_init().await?;
    /// assert!(Arc::ptr_eq(&first, &second));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<F, Fut>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<T>, E>> + Send + 'static,
    {
        Self {
            name,
            cell: OnceCell::new(),
            factory: Box::new(move || -> BoxFuture<'static, Result<Arc<T>, E>> {
                Box::pin(factory())
            }),
        }
    }

    /// Return the resource, constructing it if this is the first call.
    ///
    /// A failed construction is not stored; the next caller tries again.
    ///
    /// # Errors
    ///
    /// Returns the factory's error if construction fails.
    pub async fn get_or_init(&self) -> Result<Arc<T>, E> {
        if let Some(ready) = self.cell.get() {
            return Ok(Arc::clone(ready));
        }

        let resource = self
            .cell
            .get_or_try_init(|| async {
                debug!(resource = self.name, "Constructing shared resource");
                let built = (self.factory)().await?;
                info!(resource = self.name, "Shared resource initialized");
                Ok::<Arc<T>, E>(built)
            })
            .await?;

        Ok(Arc::clone(resource))
    }

    /// Return the resource if it has already been constructed
    #[must_use]
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    /// Whether construction has completed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    /// Name used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}
