pub mod aggregator;
pub mod api;
pub mod fetcher;
pub mod harvester;
pub mod proxy_selector;
pub mod storage;
