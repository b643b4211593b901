//! Image gallery feature.
//!
//! CRUD over gallery records plus AI generation of a derivative image from
//! the uploaded one. Every route is public.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/imagenes/` | List every record |
//! | POST | `/imagenes/` | Upload an image and create its record |
//! | GET | `/imagenes/{id}` | Get one record |
//! | PUT | `/imagenes/{id}` | Update name and description |
//! | DELETE | `/imagenes/{id}` | Delete a record |
//! | POST | `/imagenes/generar_imagen_ia` | Generate an image for an existing record |
//! | POST | `/imagenes/subir_y_generar_ia` | Upload, generate and create in one call |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use routes::routes;
pub use services::GalleryService;
