pub mod scenario_dto;
pub mod scheduler_dto;
