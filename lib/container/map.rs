use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{rollback::Rollback, MonoboxError, MonoboxResult};

use super::{Container, ContainerId};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The in-memory container registry, indexed by ID and by name.
///
/// `ContainerMap` is a cheap clone handle over shared state, so a rollback
/// action can capture its own handle and deregister a container without
/// borrowing from the orchestrator. Individual operations are atomic; ordering
/// across operations comes from the orchestrator, which serializes every
/// lifecycle operation.
#[derive(Clone, Debug, Default)]
pub struct ContainerMap {
    inner: Arc<RwLock<ContainerMapInner>>,
}

#[derive(Debug, Default)]
struct ContainerMapInner {
    by_id: HashMap<ContainerId, Container>,
    by_name: HashMap<String, ContainerId>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ContainerMap {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a container under both indices.
    ///
    /// Fails with `DuplicateContainerId` / `DuplicateContainerName` without
    /// inserting anything. On success, if a rollback is supplied, a
    /// compensating [`del`](Self::del) is registered with it.
    pub fn add(&self, container: Container, rollback: Option<&mut Rollback>) -> MonoboxResult<()> {
        let id = container.get_id().clone();
        let name = container.get_name().clone();

        {
            let mut inner = self.write_inner();
            if inner.by_id.contains_key(&id) {
                return Err(MonoboxError::DuplicateContainerId(id.to_string()));
            }
            if inner.by_name.contains_key(&name) {
                return Err(MonoboxError::DuplicateContainerName(name));
            }
            inner.by_name.insert(name, id.clone());
            inner.by_id.insert(id.clone(), container);
        }

        if let Some(rollback) = rollback {
            let map = self.clone();
            rollback.add(move || map.del(&id));
        }

        Ok(())
    }

    /// Returns a copy of the container with the given ID.
    pub fn get(&self, id: &ContainerId) -> Option<Container> {
        self.read_inner().by_id.get(id).cloned()
    }

    /// Returns a copy of the container with the given name.
    pub fn get_by_name(&self, name: &str) -> Option<Container> {
        let inner = self.read_inner();
        let id = inner.by_name.get(name)?;
        inner.by_id.get(id).cloned()
    }

    /// Removes a container from both indices. Unknown IDs are a no-op.
    pub fn del(&self, id: &ContainerId) {
        let mut inner = self.write_inner();
        if let Some(container) = inner.by_id.remove(id) {
            inner.by_name.remove(container.get_name());
        }
    }

    /// Replaces the registered copy of an already-registered container.
    pub fn update(&self, container: &Container) -> MonoboxResult<()> {
        let mut inner = self.write_inner();
        match inner.by_id.get_mut(container.get_id()) {
            Some(existing) => {
                *existing = container.clone();
                Ok(())
            }
            None => Err(MonoboxError::ContainerNotFound(
                container.get_id().to_string(),
            )),
        }
    }

    /// Returns a copy of every registered container, in no particular order.
    pub fn all(&self) -> Vec<Container> {
        self.read_inner().by_id.values().cloned().collect()
    }

    /// Returns the number of registered containers.
    pub fn len(&self) -> usize {
        self.read_inner().by_id.len()
    }

    /// Returns true if no containers are registered.
    pub fn is_empty(&self) -> bool {
        self.read_inner().by_id.is_empty()
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, ContainerMapInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, ContainerMapInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use crate::container::ContainerStatus;

    use super::*;

    fn make_container(name: &str) -> Container {
        Container::new(
            ContainerId::random(),
            name,
            "/bin/true",
            vec![],
            "/tmp/rootfs",
            "/tmp/log",
        )
        .unwrap()
    }

    #[test]
    fn test_map_add_and_get() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let container = make_container("first");
        let id = container.get_id().clone();

        map.add(container, None)?;

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&id).unwrap().get_name(), "first");
        assert_eq!(
            map.get_by_name("first").unwrap().get_id(),
            &id
        );
        assert!(map.get_by_name("second").is_none());
        Ok(())
    }

    #[test]
    fn test_map_rejects_duplicate_id_and_name() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let container = make_container("taken");
        let id = container.get_id().clone();
        map.add(container.clone(), None)?;

        assert!(matches!(
            map.add(container, None),
            Err(MonoboxError::DuplicateContainerId(_))
        ));

        let same_name = Container::new(
            ContainerId::random(),
            "taken",
            "/bin/true",
            vec![],
            "/tmp/rootfs",
            "/tmp/log",
        )?;
        assert!(matches!(
            map.add(same_name, None),
            Err(MonoboxError::DuplicateContainerName(_))
        ));

        // The failed adds must not have clobbered the original entry
        assert_eq!(map.len(), 1);
        assert_eq!(map.get_by_name("taken").unwrap().get_id(), &id);
        Ok(())
    }

    #[test]
    fn test_map_del_removes_both_indices() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let container = make_container("gone");
        let id = container.get_id().clone();
        map.add(container, None)?;

        map.del(&id);

        assert!(map.get(&id).is_none());
        assert!(map.get_by_name("gone").is_none());
        assert!(map.is_empty());

        // Deleting again is a no-op
        map.del(&id);
        Ok(())
    }

    #[test]
    fn test_map_add_registers_rollback_del() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let mut rollback = Rollback::new();
        let container = make_container("undone");
        let id = container.get_id().clone();

        map.add(container, Some(&mut rollback))?;
        assert_eq!(rollback.len(), 1);
        assert!(map.get(&id).is_some());

        rollback.execute();
        assert!(map.get(&id).is_none());
        assert!(map.get_by_name("undone").is_none());
        Ok(())
    }

    #[test]
    fn test_map_failed_add_registers_nothing() {
        let map = ContainerMap::new();
        let mut rollback = Rollback::new();
        let container = make_container("dup");
        map.add(container.clone(), None).unwrap();

        assert!(map.add(container, Some(&mut rollback)).is_err());
        assert!(rollback.is_empty());
    }

    #[test]
    fn test_map_update_replaces_registered_copy() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let mut container = make_container("mutating");
        let id = container.get_id().clone();
        map.add(container.clone(), None)?;

        container.set_status(ContainerStatus::Running);
        map.update(&container)?;

        assert_eq!(
            *map.get(&id).unwrap().get_status(),
            ContainerStatus::Running
        );

        map.del(&id);
        assert!(matches!(
            map.update(&container),
            Err(MonoboxError::ContainerNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_map_clones_share_state() -> anyhow::Result<()> {
        let map = ContainerMap::new();
        let handle = map.clone();
        let container = make_container("shared");
        let id = container.get_id().clone();

        map.add(container, None)?;
        assert!(handle.get(&id).is_some());

        handle.del(&id);
        assert!(map.get(&id).is_none());
        Ok(())
    }
}
