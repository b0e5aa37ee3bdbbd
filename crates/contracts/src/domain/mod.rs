pub mod a030_vehicle_model;
