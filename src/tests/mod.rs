use fixture::Fixture;

mod fixture;

mod dragging;
mod trash;
