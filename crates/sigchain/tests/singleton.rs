//! The process-wide registry. Kept in its own test binary so no other test
//! shares the global instance.

use sigchain::registry;
use sigchain::store::SqliteChainStore;
use sigchain::{SigChainConfig, SigChainError, SigChainService};

fn service() -> SigChainService<SqliteChainStore> {
    SigChainService::new(SqliteChainStore::in_memory(), SigChainConfig::default())
}

#[tokio::test]
async fn test_initialize_exactly_once() {
    assert!(matches!(
        registry::instance(),
        Err(SigChainError::NotInitialized)
    ));

    let instance = registry::init(service()).unwrap();
    instance.create_chain("team", "u", true).unwrap();

    assert!(matches!(
        registry::init(service()),
        Err(SigChainError::AlreadyInitialized)
    ));

    // The first instance is still the one handed out.
    let again = registry::instance().unwrap();
    assert_eq!(again.get_active_chain().unwrap().name(), "team");
    again.save_chain("team").await.unwrap();
}
