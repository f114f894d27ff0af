mod hashmap_session_store;
mod record;
mod redis_session_store;

pub use hashmap_session_store::HashMapSessionStore;
pub use record::SessionRecord;
pub use redis_session_store::RedisSessionStore;
