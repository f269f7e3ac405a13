mod bind_join;
mod group;
mod sort;
