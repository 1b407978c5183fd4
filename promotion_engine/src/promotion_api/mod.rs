pub mod pricing_api;
pub mod promotion_flow_api;
pub mod promotion_objects;
