mod callbacks;
mod internal;
mod mocks;
mod promotions;
