mod credentials;
mod turn_lifecycle;
