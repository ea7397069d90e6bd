pub type SmallVec2<T> = smallvec::SmallVec<[T; 2]>;
