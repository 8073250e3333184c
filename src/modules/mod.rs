pub mod face_attribute_client;
pub mod face_detection_client;
